pub mod features;
pub mod server;
pub mod shared;

use std::sync::Arc;

use tracing::{info, warn};

use crate::features::access_control::service::{AllowAllGate, PermissionGate, StaticPermissionGate};
use crate::features::build_dispatch::repo::ReqwestBuildTriggerRepository;
use crate::features::build_dispatch::service::BuildDispatchService;
use crate::features::commands::controller::CommandController;
use crate::features::edp_resolution::service::EdpResolverService;
use crate::features::fleet_report::service::FleetReportService;
use crate::features::inventory::repo::snapshot::SnapshotInventoryRepository;
use crate::features::inventory::repo::InventoryRepository;
use crate::features::inventory::service::InventoryService;
use crate::features::observability::controller::ObservabilityController;
use crate::features::version_sets::service::VersionSetService;
use crate::shared::config::ControlPlaneConfig;
use crate::shared::error::ControlPlaneResult;

/// Gate built from the configured user list. Without one every caller is
/// allowed.
pub fn permission_gate(config: &ControlPlaneConfig) -> Arc<dyn PermissionGate> {
    match &config.authorized_users {
        Some(users) => {
            info!(users = users.len(), "Restricting commands to authorized users");
            Arc::new(StaticPermissionGate::new(users.iter().cloned()))
        }
        None => {
            warn!("No authorized users configured, every caller may build images");
            Arc::new(AllowAllGate)
        }
    }
}

/// Wires the command controller over the given inventory source.
pub fn command_controller(
    config: &ControlPlaneConfig,
    inventory_repo: Arc<dyn InventoryRepository>,
    gate: Arc<dyn PermissionGate>,
    observability: Arc<ObservabilityController>,
) -> ControlPlaneResult<Arc<CommandController>> {
    let inventory = Arc::new(InventoryService::new(
        inventory_repo,
        config.inventory.timeout,
    ));
    let resolver = Arc::new(
        EdpResolverService::new(inventory.clone()).with_observability(observability.clone()),
    );
    let version_sets = Arc::new(VersionSetService::new(inventory.clone(), resolver));
    let trigger = Arc::new(ReqwestBuildTriggerRepository::new(&config.build_trigger)?);
    let dispatch = Arc::new(BuildDispatchService::new(trigger, &config.build_trigger)?);
    let fleet = Arc::new(FleetReportService::new(inventory));

    Ok(Arc::new(CommandController::new(
        gate,
        version_sets,
        dispatch,
        fleet,
        observability,
    )))
}

/// Production wiring: snapshot-backed inventory and the HTTP build trigger.
pub fn build_command_controller(
    config: &ControlPlaneConfig,
    observability: Arc<ObservabilityController>,
) -> ControlPlaneResult<Arc<CommandController>> {
    let inventory_repo = Arc::new(SnapshotInventoryRepository::new(
        config.inventory.snapshot_path.clone(),
    ));
    command_controller(config, inventory_repo, permission_gate(config), observability)
}
