use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::features::inventory::repo::InventoryRepository;
use crate::shared::error::{ControlPlaneError, ControlPlaneResult};
use amicut_core::{Image, Instance, InstanceFilter, LoadBalancer};

/// Inventory document written by an external exporter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventorySnapshot {
    #[serde(default)]
    pub instances: Vec<Instance>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub load_balancers: Vec<LoadBalancer>,
}

/// Reads the snapshot file on every call so a refreshed export is picked up
/// immediately.
#[derive(Debug, Clone)]
pub struct SnapshotInventoryRepository {
    path: PathBuf,
}

impl SnapshotInventoryRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> ControlPlaneResult<InventorySnapshot> {
        let raw = tokio::fs::read(&self.path).await.map_err(|e| {
            ControlPlaneError::Inventory(format!(
                "failed to read inventory snapshot {}: {e}",
                self.path.display()
            ))
        })?;
        serde_json::from_slice(&raw).map_err(|e| {
            ControlPlaneError::Inventory(format!(
                "failed to parse inventory snapshot {}: {e}",
                self.path.display()
            ))
        })
    }
}

#[async_trait]
impl InventoryRepository for SnapshotInventoryRepository {
    async fn list_instances(&self, filter: &InstanceFilter) -> ControlPlaneResult<Vec<Instance>> {
        let snapshot = self.load().await?;
        Ok(snapshot
            .instances
            .into_iter()
            .filter(|instance| filter.matches(instance))
            .collect())
    }

    async fn get_image(&self, image_id: &str) -> ControlPlaneResult<Image> {
        let snapshot = self.load().await?;
        snapshot
            .images
            .into_iter()
            .find(|image| image.image_id == image_id)
            .ok_or_else(|| ControlPlaneError::NotFound(format!("no image with id {image_id}")))
    }

    async fn list_load_balancers(&self) -> ControlPlaneResult<Vec<LoadBalancer>> {
        Ok(self.load().await?.load_balancers)
    }
}
