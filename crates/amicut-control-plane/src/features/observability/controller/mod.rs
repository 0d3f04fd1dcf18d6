use crate::features::observability::repo::ObservabilityRepository;
use crate::features::observability::service::ObservabilityService;
use std::sync::Arc;

pub struct ObservabilityController {
    service: ObservabilityService,
}

impl ObservabilityController {
    pub fn new(service: ObservabilityService) -> Self {
        Self { service }
    }

    /// Controller backed by a fresh metrics registry.
    pub fn with_registry() -> Result<Arc<Self>, String> {
        let repo = ObservabilityRepository::new()?;
        Ok(Arc::new(Self::new(ObservabilityService::new(Arc::new(
            repo,
        )))))
    }

    pub fn record_command(&self, command: &str, status: &str, seconds: f64) {
        self.service.record_command(command, status, seconds);
    }

    pub fn record_edp_resolution(&self, outcome: &str) {
        self.service.record_edp_resolution(outcome);
    }

    pub fn record_build_dispatch(&self, outcome: &str) {
        self.service.record_build_dispatch(outcome);
    }

    pub fn render_metrics(&self) -> Result<String, String> {
        self.service.render_metrics()
    }
}
