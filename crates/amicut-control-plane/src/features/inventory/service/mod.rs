use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::features::inventory::repo::InventoryRepository;
use crate::shared::error::{ControlPlaneError, ControlPlaneResult};
use amicut_core::{Image, Instance, InstanceFilter, LoadBalancer};

/// Inventory gateway with a bounded wait on every external call.
///
/// A timed out call is a transient failure and surfaces as
/// [`ControlPlaneError::Timeout`], never as an empty result.
pub struct InventoryService {
    repo: Arc<dyn InventoryRepository>,
    timeout: Duration,
}

impl InventoryService {
    pub fn new(repo: Arc<dyn InventoryRepository>, timeout: Duration) -> Self {
        Self { repo, timeout }
    }

    pub async fn list_instances(&self, filter: &InstanceFilter) -> ControlPlaneResult<Vec<Instance>> {
        let instances = self
            .bounded("list_instances", self.repo.list_instances(filter))
            .await?;
        debug!(
            environment = %filter.environment,
            deployment = %filter.deployment,
            play = ?filter.play,
            count = instances.len(),
            "Listed instances"
        );
        Ok(instances)
    }

    pub async fn list_running_instances(
        &self,
        filter: &InstanceFilter,
    ) -> ControlPlaneResult<Vec<Instance>> {
        let mut instances = self.list_instances(filter).await?;
        instances.retain(Instance::is_running);
        Ok(instances)
    }

    pub async fn get_image(&self, image_id: &str) -> ControlPlaneResult<Image> {
        self.bounded("get_image", self.repo.get_image(image_id))
            .await
    }

    pub async fn list_load_balancers(&self) -> ControlPlaneResult<Vec<LoadBalancer>> {
        self.bounded("list_load_balancers", self.repo.list_load_balancers())
            .await
    }

    async fn bounded<T, F>(&self, operation: &str, call: F) -> ControlPlaneResult<T>
    where
        F: Future<Output = ControlPlaneResult<T>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                ControlPlaneError::Timeout(format!(
                    "inventory {operation} did not answer within {}s",
                    self.timeout.as_secs_f64()
                ))
            })?
    }
}
