pub mod build;
pub mod command;
pub mod fleet;
pub mod live_image;
pub mod report;
pub mod tags;
pub mod versions;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use build::{BuildParams, BuildRequest};
pub use fleet::{Image, Instance, InstanceFilter, InstanceState, LoadBalancer};
pub use live_image::LiveImage;
pub use tags::{DecodedVersions, TagDefect};
pub use versions::{Override, PlayVersions, VersionSet};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Malformed override '{0}': expected key=value")]
    MalformedOverride(String),
    #[error("Invalid EDP '{0}': expected environment-deployment-play")]
    InvalidEdp(String),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Environment, deployment and play identifying one logical cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edp {
    pub environment: String,
    pub deployment: String,
    pub play: String,
}

impl Edp {
    pub fn new(
        environment: impl Into<String>,
        deployment: impl Into<String>,
        play: impl Into<String>,
    ) -> Self {
        Self {
            environment: environment.into(),
            deployment: deployment.into(),
            play: play.into(),
        }
    }

    pub fn filter(&self) -> InstanceFilter {
        InstanceFilter::for_edp(self)
    }
}

impl fmt::Display for Edp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.environment, self.deployment, self.play)
    }
}

impl FromStr for Edp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('-').collect();
        match parts.as_slice() {
            [env, dep, play] if [env, dep, play].iter().all(|p| is_word(p)) => {
                Ok(Edp::new(*env, *dep, *play))
            }
            _ => Err(CoreError::InvalidEdp(s.to_string())),
        }
    }
}

/// True for a non-empty run of ASCII letters, digits and underscores.
pub fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Error response rendered at the command boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

impl From<CoreError> for ErrorResponse {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::MalformedOverride(_) => "MALFORMED_OVERRIDE",
            CoreError::InvalidEdp(_) => "INVALID_EDP",
            CoreError::InvalidCommand(_) => "INVALID_COMMAND",
            CoreError::Serialization(_) => "SERIALIZATION_ERROR",
        };
        ErrorResponse::new(code, err.to_string())
    }
}
