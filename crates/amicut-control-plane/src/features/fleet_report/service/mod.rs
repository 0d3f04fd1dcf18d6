use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::features::inventory::service::InventoryService;
use crate::shared::error::{ControlPlaneError, ControlPlaneResult};
use amicut_core::fleet::serving_load_balancers;
use amicut_core::report::{instance_rows, StatusRow};
use amicut_core::tags::version_refs;
use amicut_core::{Edp, Image, InstanceFilter};

/// Read-only views of a cluster for operators.
pub struct FleetReportService {
    inventory: Arc<InventoryService>,
}

impl FleetReportService {
    pub fn new(inventory: Arc<InventoryService>) -> Self {
        Self { inventory }
    }

    /// Plays with at least one running instance in the environment and deployment.
    pub async fn list_active_plays(
        &self,
        environment: &str,
        deployment: &str,
    ) -> ControlPlaneResult<BTreeSet<String>> {
        let instances = self
            .inventory
            .list_running_instances(&InstanceFilter::for_cluster(environment, deployment))
            .await?;

        Ok(instances
            .iter()
            .filter_map(|instance| instance.play())
            .map(ToString::to_string)
            .collect())
    }

    /// One block of rows per running instance: internal name, version refs of
    /// its image, load balancers serving it and the image id.
    pub async fn describe_edp(&self, edp: &Edp) -> ControlPlaneResult<Vec<StatusRow>> {
        let instances = self.inventory.list_running_instances(&edp.filter()).await?;
        if instances.is_empty() {
            return Err(ControlPlaneError::NotFound(format!(
                "no running instances for {edp}"
            )));
        }
        let load_balancers = self.inventory.list_load_balancers().await?;

        let mut refs_by_image: HashMap<String, Vec<String>> = HashMap::new();
        let mut rows = Vec::new();
        for instance in &instances {
            debug!(instance = %instance.private_dns_name, "Getting info for instance");

            if !refs_by_image.contains_key(&instance.image_id) {
                let refs = match self.inventory.get_image(&instance.image_id).await {
                    Ok(image) => version_refs(&image.tags),
                    Err(ControlPlaneError::NotFound(_)) => Vec::new(),
                    Err(error) => return Err(error),
                };
                refs_by_image.insert(instance.image_id.clone(), refs);
            }
            let refs = refs_by_image
                .get(&instance.image_id)
                .map(Vec::as_slice)
                .unwrap_or_default();

            let lbs: Vec<String> = serving_load_balancers(&instance.instance_id, &load_balancers)
                .into_iter()
                .map(ToString::to_string)
                .collect();

            rows.extend(instance_rows(
                &instance.private_dns_name,
                refs,
                &lbs,
                &instance.image_id,
            ));
        }

        Ok(rows)
    }

    pub async fn describe_image(&self, image_id: &str) -> ControlPlaneResult<Image> {
        self.inventory.get_image(image_id).await
    }
}
