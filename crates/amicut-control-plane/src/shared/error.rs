use amicut_core::{CoreError, Edp};
use thiserror::Error;

/// Control plane specific errors
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("No live image for {0}: no running instance is behind a load balancer")]
    NoLiveImage(Edp),
    #[error(
        "Multiple AMIs found for {edp} ({}), there should be only one. Please resolve any running deploys there before running this command.",
        .images.join(", ")
    )]
    AmbiguousLiveImage { edp: Edp, images: Vec<String> },
    #[error("Malformed override '{0}': expected key=value")]
    MalformedOverride(String),
    #[error("Dispatch failure: {0}")]
    DispatchFailure(String),
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Inventory error: {0}")]
    Inventory(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<CoreError> for ControlPlaneError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MalformedOverride(token) => ControlPlaneError::MalformedOverride(token),
            CoreError::InvalidEdp(_) | CoreError::InvalidCommand(_) => {
                ControlPlaneError::InvalidCommand(err.to_string())
            }
            CoreError::Serialization(msg) => ControlPlaneError::Serialization(msg),
        }
    }
}

impl From<ControlPlaneError> for amicut_core::ErrorResponse {
    fn from(err: ControlPlaneError) -> Self {
        let code = match &err {
            ControlPlaneError::NotFound(_) => "NOT_FOUND",
            ControlPlaneError::NoLiveImage(_) => "NO_LIVE_IMAGE",
            ControlPlaneError::AmbiguousLiveImage { .. } => "AMBIGUOUS_LIVE_IMAGE",
            ControlPlaneError::MalformedOverride(_) => "MALFORMED_OVERRIDE",
            ControlPlaneError::DispatchFailure(_) => "DISPATCH_FAILURE",
            ControlPlaneError::ConfigurationMissing(_) => "CONFIGURATION_MISSING",
            ControlPlaneError::Timeout(_) => "TIMEOUT",
            ControlPlaneError::Inventory(_) => "INVENTORY_ERROR",
            ControlPlaneError::PermissionDenied(_) => "PERMISSION_DENIED",
            ControlPlaneError::InvalidCommand(_) => "INVALID_COMMAND",
            ControlPlaneError::Serialization(_) => "SERIALIZATION_ERROR",
        };

        amicut_core::ErrorResponse::new(code, err.to_string())
    }
}

pub type ControlPlaneResult<T> = std::result::Result<T, ControlPlaneError>;
