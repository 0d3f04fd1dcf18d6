pub mod snapshot;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::shared::error::{ControlPlaneError, ControlPlaneResult};
use amicut_core::{Image, Instance, InstanceFilter, LoadBalancer};

/// Read access to the cloud inventory. Every call is a fresh point-in-time
/// read; implementations must not cache between calls.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn list_instances(&self, filter: &InstanceFilter) -> ControlPlaneResult<Vec<Instance>>;
    async fn get_image(&self, image_id: &str) -> ControlPlaneResult<Image>;
    async fn list_load_balancers(&self) -> ControlPlaneResult<Vec<LoadBalancer>>;
}

#[derive(Clone, Default)]
pub struct InMemoryInventoryRepository {
    instances: Arc<RwLock<Vec<Instance>>>,
    images: Arc<RwLock<HashMap<String, Image>>>,
    load_balancers: Arc<RwLock<Vec<LoadBalancer>>>,
}

impl InMemoryInventoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert_instance(&self, instance: Instance) {
        let mut instances = self.instances.write().await;
        instances.retain(|existing| existing.instance_id != instance.instance_id);
        instances.push(instance);
    }

    pub async fn upsert_image(&self, image: Image) {
        let mut images = self.images.write().await;
        images.insert(image.image_id.clone(), image);
    }

    pub async fn upsert_load_balancer(&self, load_balancer: LoadBalancer) {
        let mut load_balancers = self.load_balancers.write().await;
        load_balancers.retain(|existing| existing.name != load_balancer.name);
        load_balancers.push(load_balancer);
    }
}

#[async_trait]
impl InventoryRepository for InMemoryInventoryRepository {
    async fn list_instances(&self, filter: &InstanceFilter) -> ControlPlaneResult<Vec<Instance>> {
        let instances = self.instances.read().await;
        Ok(instances
            .iter()
            .filter(|instance| filter.matches(instance))
            .cloned()
            .collect())
    }

    async fn get_image(&self, image_id: &str) -> ControlPlaneResult<Image> {
        let images = self.images.read().await;
        images
            .get(image_id)
            .cloned()
            .ok_or_else(|| ControlPlaneError::NotFound(format!("no image with id {image_id}")))
    }

    async fn list_load_balancers(&self) -> ControlPlaneResult<Vec<LoadBalancer>> {
        let load_balancers = self.load_balancers.read().await;
        Ok(load_balancers.clone())
    }
}
