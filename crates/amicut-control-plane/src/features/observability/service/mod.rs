use crate::features::observability::repo::ObservabilityRepository;
use std::sync::Arc;

pub struct ObservabilityService {
    repo: Arc<ObservabilityRepository>,
}

impl ObservabilityService {
    pub fn new(repo: Arc<ObservabilityRepository>) -> Self {
        Self { repo }
    }

    pub fn record_command(&self, command: &str, status: &str, seconds: f64) {
        self.repo.observe_command(command, status, seconds);
    }

    pub fn record_edp_resolution(&self, outcome: &str) {
        self.repo.inc_edp_resolution(outcome);
    }

    pub fn record_build_dispatch(&self, outcome: &str) {
        self.repo.inc_build_dispatch(outcome);
    }

    pub fn render_metrics(&self) -> Result<String, String> {
        self.repo.render_metrics()
    }
}
