use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::shared::config::BuildTriggerConfig;
use crate::shared::error::{ControlPlaneError, ControlPlaneResult};
use amicut_core::BuildParams;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerResponse {
    pub status: u16,
    pub body: String,
}

/// The external build trigger. One call per build; callers must not retry
/// since a repeated trigger may start a duplicate build.
#[async_trait]
pub trait BuildTriggerRepository: Send + Sync {
    async fn trigger(&self, url: &Url) -> ControlPlaneResult<TriggerResponse>;
}

/// Appends the build parameters to the endpoint's query string. The same URL
/// is used for the real request and the dry-run preview.
pub fn render_trigger_url(endpoint: &Url, params: &BuildParams) -> Url {
    let mut url = endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        for (name, value) in params.iter() {
            query.append_pair(name, value);
        }
    }
    url
}

pub struct ReqwestBuildTriggerRepository {
    client: Client,
}

impl ReqwestBuildTriggerRepository {
    pub fn new(config: &BuildTriggerConfig) -> ControlPlaneResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ControlPlaneError::DispatchFailure(format!("failed to build http client: {e}"))
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BuildTriggerRepository for ReqwestBuildTriggerRepository {
    async fn trigger(&self, url: &Url) -> ControlPlaneResult<TriggerResponse> {
        let response = self.client.post(url.clone()).send().await.map_err(|e| {
            ControlPlaneError::DispatchFailure(format!("failed to reach build trigger: {e}"))
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            ControlPlaneError::DispatchFailure(format!(
                "build trigger answered {status} but the body could not be read: {e}"
            ))
        })?;

        Ok(TriggerResponse { status, body })
    }
}
