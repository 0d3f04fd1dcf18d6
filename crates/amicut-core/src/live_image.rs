use std::collections::{BTreeSet, HashSet};

use crate::fleet::{Instance, LoadBalancer};

/// Outcome of looking for the image a cluster is serving.
///
/// A cluster should serve exactly one image. Several images behind load
/// balancers means a deploy is in flight or stuck; callers must stop rather
/// than pick one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveImage {
    Found(String),
    Absent,
    Ambiguous(Vec<String>),
}

impl LiveImage {
    /// Distinct images of running instances that belong to at least one load
    /// balancer. Instance order does not affect the result.
    pub fn evaluate(instances: &[Instance], load_balancers: &[LoadBalancer]) -> Self {
        let served: HashSet<&str> = load_balancers
            .iter()
            .flat_map(|lb| lb.instance_ids.iter().map(String::as_str))
            .collect();

        let images: BTreeSet<&str> = instances
            .iter()
            .filter(|instance| instance.is_running())
            .filter(|instance| served.contains(instance.instance_id.as_str()))
            .map(|instance| instance.image_id.as_str())
            .collect();

        Self::from_candidates(images.into_iter().map(str::to_string).collect())
    }

    pub fn from_candidates(mut images: Vec<String>) -> Self {
        images.sort();
        images.dedup();
        match images.len() {
            0 => LiveImage::Absent,
            1 => LiveImage::Found(images.remove(0)),
            _ => LiveImage::Ambiguous(images),
        }
    }

    pub fn outcome_label(&self) -> &'static str {
        match self {
            LiveImage::Found(_) => "found",
            LiveImage::Absent => "none",
            LiveImage::Ambiguous(_) => "ambiguous",
        }
    }
}
