//! Point-in-time views of fleet inventory.
//!
//! Instances, load balancers and images are owned by the cloud platform; these
//! types are read-only snapshots of whatever the inventory gateway returned.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::Edp;

pub const TAG_ENVIRONMENT: &str = "environment";
pub const TAG_DEPLOYMENT: &str = "deployment";
pub const TAG_PLAY: &str = "play";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub instance_id: String,
    pub state: InstanceState,
    pub image_id: String,
    #[serde(default)]
    pub private_dns_name: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Instance {
    pub fn is_running(&self) -> bool {
        self.state == InstanceState::Running
    }

    pub fn play(&self) -> Option<&str> {
        self.tags.get(TAG_PLAY).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub name: String,
    #[serde(default)]
    pub instance_ids: Vec<String>,
}

impl LoadBalancer {
    pub fn has_member(&self, instance_id: &str) -> bool {
        self.instance_ids.iter().any(|id| id == instance_id)
    }
}

/// Names of the load balancers that list `instance_id` as a member, in listing order.
pub fn serving_load_balancers<'a>(
    instance_id: &str,
    load_balancers: &'a [LoadBalancer],
) -> Vec<&'a str> {
    load_balancers
        .iter()
        .filter(|lb| lb.has_member(instance_id))
        .map(|lb| lb.name.as_str())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub image_id: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Tag filter for instance listings. `play` of `None` matches every play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceFilter {
    pub environment: String,
    pub deployment: String,
    pub play: Option<String>,
}

impl InstanceFilter {
    pub fn for_cluster(environment: impl Into<String>, deployment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            deployment: deployment.into(),
            play: None,
        }
    }

    pub fn for_edp(edp: &Edp) -> Self {
        Self {
            environment: edp.environment.clone(),
            deployment: edp.deployment.clone(),
            play: Some(edp.play.clone()),
        }
    }

    pub fn matches(&self, instance: &Instance) -> bool {
        let tag = |key: &str| instance.tags.get(key).map(String::as_str);
        tag(TAG_ENVIRONMENT) == Some(self.environment.as_str())
            && tag(TAG_DEPLOYMENT) == Some(self.deployment.as_str())
            && match &self.play {
                Some(play) => tag(TAG_PLAY) == Some(play.as_str()),
                None => true,
            }
    }
}
