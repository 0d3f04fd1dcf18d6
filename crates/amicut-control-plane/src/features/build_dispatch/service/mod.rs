use std::sync::Arc;

use reqwest::Url;
use tracing::{info, warn};

use crate::features::build_dispatch::repo::{render_trigger_url, BuildTriggerRepository};
use crate::shared::config::BuildTriggerConfig;
use crate::shared::error::{ControlPlaneError, ControlPlaneResult};
use amicut_core::BuildRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Dry run: the request that would have been sent.
    Previewed { request: String },
    Triggered { status: u16 },
    /// The trigger answered with a non-success status.
    Rejected { status: u16, body: String },
}

impl DispatchOutcome {
    pub fn outcome_label(&self) -> &'static str {
        match self {
            DispatchOutcome::Previewed { .. } => "previewed",
            DispatchOutcome::Triggered { .. } => "triggered",
            DispatchOutcome::Rejected { .. } => "rejected",
        }
    }
}

pub struct BuildDispatchService {
    repo: Arc<dyn BuildTriggerRepository>,
    endpoint: Url,
}

impl BuildDispatchService {
    pub fn new(
        repo: Arc<dyn BuildTriggerRepository>,
        config: &BuildTriggerConfig,
    ) -> ControlPlaneResult<Self> {
        let endpoint = Url::parse(&config.url).map_err(|e| {
            ControlPlaneError::ConfigurationMissing(format!("invalid build trigger url: {e}"))
        })?;
        Ok(Self { repo, endpoint })
    }

    /// Sends the request once, or only renders it when `dry_run` is set.
    pub async fn dispatch(
        &self,
        request: &BuildRequest,
        dry_run: bool,
    ) -> ControlPlaneResult<DispatchOutcome> {
        let params = request.params()?;
        let url = render_trigger_url(&self.endpoint, &params);

        if dry_run {
            info!(edp = %request.edp, "Dry run, build trigger not called");
            return Ok(DispatchOutcome::Previewed {
                request: format!("POST {url}"),
            });
        }

        info!(
            edp = %request.edp,
            base_image = ?request.base_image_id,
            use_blessed = request.use_blessed(),
            "Triggering image build"
        );
        let response = self.repo.trigger(&url).await?;

        if response.status == 200 {
            info!(edp = %request.edp, status = response.status, "Build trigger accepted request");
            Ok(DispatchOutcome::Triggered {
                status: response.status,
            })
        } else {
            warn!(
                edp = %request.edp,
                status = response.status,
                body = %response.body,
                "Build trigger rejected request"
            );
            Ok(DispatchOutcome::Rejected {
                status: response.status,
                body: response.body,
            })
        }
    }
}
