use std::sync::Arc;

use tracing::{info, warn};

use crate::features::inventory::service::InventoryService;
use crate::features::observability::controller::ObservabilityController;
use crate::shared::error::{ControlPlaneError, ControlPlaneResult};
use amicut_core::{Edp, LiveImage};

/// Finds the image an EDP is serving traffic from.
pub struct EdpResolverService {
    inventory: Arc<InventoryService>,
    observability: Option<Arc<ObservabilityController>>,
}

impl EdpResolverService {
    pub fn new(inventory: Arc<InventoryService>) -> Self {
        Self {
            inventory,
            observability: None,
        }
    }

    pub fn with_observability(mut self, observability: Arc<ObservabilityController>) -> Self {
        self.observability = Some(observability);
        self
    }

    /// Running instances of the EDP that sit behind at least one load
    /// balancer, reduced to their distinct images. The load balancer listing
    /// is fetched once per call and shared by every instance check.
    pub async fn resolve(&self, edp: &Edp) -> ControlPlaneResult<LiveImage> {
        let instances = self.inventory.list_running_instances(&edp.filter()).await?;
        let load_balancers = self.inventory.list_load_balancers().await?;

        let live = LiveImage::evaluate(&instances, &load_balancers);
        if let Some(observability) = &self.observability {
            observability.record_edp_resolution(live.outcome_label());
        }
        match &live {
            LiveImage::Found(image_id) => {
                info!(edp = %edp, image_id = %image_id, "Resolved live image")
            }
            LiveImage::Absent => {
                warn!(edp = %edp, running = instances.len(), "No served instances found")
            }
            LiveImage::Ambiguous(images) => {
                warn!(edp = %edp, images = ?images, "Multiple live images found")
            }
        }
        Ok(live)
    }

    /// Like [`resolve`](Self::resolve) but only accepts a single live image.
    pub async fn live_image_id(&self, edp: &Edp) -> ControlPlaneResult<String> {
        match self.resolve(edp).await? {
            LiveImage::Found(image_id) => Ok(image_id),
            LiveImage::Absent => Err(ControlPlaneError::NoLiveImage(edp.clone())),
            LiveImage::Ambiguous(images) => Err(ControlPlaneError::AmbiguousLiveImage {
                edp: edp.clone(),
                images,
            }),
        }
    }
}
