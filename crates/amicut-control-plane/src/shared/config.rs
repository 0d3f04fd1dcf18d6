use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::shared::error::{ControlPlaneError, ControlPlaneResult};

pub const ENV_BUILD_TRIGGER_URL: &str = "AMICUT_BUILD_TRIGGER_URL";
pub const ENV_INVENTORY_SNAPSHOT: &str = "AMICUT_INVENTORY_SNAPSHOT";
pub const ENV_LISTEN_ADDR: &str = "AMICUT_LISTEN_ADDR";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "AMICUT_REQUEST_TIMEOUT_SECS";
pub const ENV_AUTHORIZED_USERS: &str = "AMICUT_AUTHORIZED_USERS";

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct BuildTriggerConfig {
    pub url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub snapshot_path: PathBuf,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ControlPlaneConfig {
    pub listen_addr: SocketAddr,
    pub build_trigger: BuildTriggerConfig,
    pub inventory: InventoryConfig,
    /// `None` lets every caller run every command.
    pub authorized_users: Option<Vec<String>>,
}

impl ControlPlaneConfig {
    pub fn from_env() -> ControlPlaneResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ControlPlaneResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ControlPlaneError::ConfigurationMissing(key.to_string()))
        };

        let url = required(ENV_BUILD_TRIGGER_URL)?;
        reqwest::Url::parse(&url).map_err(|e| {
            ControlPlaneError::ConfigurationMissing(format!(
                "{ENV_BUILD_TRIGGER_URL} is not a valid URL: {e}"
            ))
        })?;
        let snapshot_path = PathBuf::from(required(ENV_INVENTORY_SNAPSHOT)?);

        let timeout_secs = match lookup(ENV_REQUEST_TIMEOUT_SECS) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                ControlPlaneError::ConfigurationMissing(format!(
                    "{ENV_REQUEST_TIMEOUT_SECS} must be a number of seconds: {e}"
                ))
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        let timeout = Duration::from_secs(timeout_secs);

        let listen_addr = lookup(ENV_LISTEN_ADDR)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| {
                ControlPlaneError::ConfigurationMissing(format!(
                    "{ENV_LISTEN_ADDR} is not a socket address: {e}"
                ))
            })?;

        let authorized_users = lookup(ENV_AUTHORIZED_USERS).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect()
        });

        Ok(Self {
            listen_addr,
            build_trigger: BuildTriggerConfig { url, timeout },
            inventory: InventoryConfig {
                snapshot_path,
                timeout,
            },
            authorized_users,
        })
    }
}
