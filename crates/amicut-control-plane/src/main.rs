use amicut_control_plane::build_command_controller;
use amicut_control_plane::features::observability::controller::ObservabilityController;
use amicut_control_plane::server::router;
use amicut_control_plane::shared::config::ControlPlaneConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ControlPlaneConfig::from_env()?;
    info!(
        listen_addr = %config.listen_addr,
        snapshot = %config.inventory.snapshot_path.display(),
        "Starting amicut control plane"
    );

    let observability = ObservabilityController::with_registry()?;
    let commands = build_command_controller(&config, observability)?;

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %config.listen_addr, "Control plane initialized successfully");
    axum::serve(listener, router(commands)).await?;

    Ok(())
}
