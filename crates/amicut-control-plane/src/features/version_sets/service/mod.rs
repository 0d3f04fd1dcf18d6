use std::sync::Arc;

use tracing::{info, warn};

use crate::features::edp_resolution::service::EdpResolverService;
use crate::features::inventory::service::InventoryService;
use crate::shared::error::ControlPlaneResult;
use amicut_core::command::BuildSource;
use amicut_core::tags::{self, DecodedVersions, TagDefect};
use amicut_core::versions::{parse_overrides, Override};
use amicut_core::{BuildRequest, Edp, VersionSet};

/// A build request ready for dispatch plus what the operator should be told
/// about how it was assembled.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub request: BuildRequest,
    pub notes: Vec<String>,
    pub defects: Vec<TagDefect>,
}

pub struct VersionSetService {
    inventory: Arc<InventoryService>,
    resolver: Arc<EdpResolverService>,
}

impl VersionSetService {
    pub fn new(inventory: Arc<InventoryService>, resolver: Arc<EdpResolverService>) -> Self {
        Self {
            inventory,
            resolver,
        }
    }

    pub fn from_blessed(&self) -> VersionSet {
        VersionSet::blessed()
    }

    pub async fn from_image(&self, image_id: &str) -> ControlPlaneResult<DecodedVersions> {
        let image = self.inventory.get_image(image_id).await?;
        let decoded = tags::decode(&image.tags);
        if !decoded.defects.is_empty() {
            warn!(image_id = %image_id, defects = decoded.defects.len(), "Image carries malformed version tags");
        }
        Ok(decoded)
    }

    /// Versions of the image an EDP is serving, with that image's id.
    pub async fn from_edp(&self, edp: &Edp) -> ControlPlaneResult<(String, DecodedVersions)> {
        let image_id = self.resolver.live_image_id(edp).await?;
        let decoded = self.from_image(&image_id).await?;
        Ok((image_id, decoded))
    }

    /// Validates every token before applying any of them.
    pub fn apply_overrides(&self, base: VersionSet, tokens: &[String]) -> ControlPlaneResult<VersionSet> {
        let overrides = parse_overrides(tokens)?;
        Ok(base.with_overrides(&overrides))
    }

    /// Assembles the request for `destination`.
    ///
    /// When the source is another EDP its live image supplies the versions
    /// while the destination's live image is the base the new image is built
    /// on, so the destination keeps its image lineage and takes on the
    /// source's versions.
    pub async fn plan(
        &self,
        destination: &Edp,
        source: &BuildSource,
        override_tokens: &[String],
    ) -> ControlPlaneResult<BuildPlan> {
        let overrides = parse_overrides(override_tokens)?;
        let mut notes = Vec::new();

        let (base_versions, base_image_id, defects) = match source {
            BuildSource::Blessed => (self.from_blessed(), None, Vec::new()),
            BuildSource::Image(image_id) => {
                notes.push(format!("Looking up ami {image_id}"));
                let decoded = self.from_image(image_id).await?;
                (decoded.versions, Some(image_id.clone()), decoded.defects)
            }
            BuildSource::Edp(source_edp) => {
                let (source_image, decoded) = self.from_edp(source_edp).await?;
                notes.push(format!(
                    "Using versions from {source_edp} live ami {source_image}"
                ));
                let destination_image = self.resolver.live_image_id(destination).await?;
                notes.push(format!(
                    "Using {destination} live ami {destination_image} as the base ami"
                ));
                (decoded.versions, Some(destination_image), decoded.defects)
            }
        };

        notes.extend(overrides.iter().map(override_note));
        let versions = base_versions.with_overrides(&overrides);

        info!(
            edp = %destination,
            base_image = ?base_image_id,
            overrides = overrides.len(),
            "Assembled build request"
        );

        Ok(BuildPlan {
            request: BuildRequest::new(destination.clone(), versions, base_image_id),
            notes,
            defects,
        })
    }
}

fn override_note(item: &Override) -> String {
    format!("Overriding '{}' for the new ami.", item.key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::inventory::repo::InMemoryInventoryRepository;
    use crate::shared::error::ControlPlaneError;
    use amicut_core::{Image, Instance, InstanceState, LoadBalancer};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn instance(id: &str, edp: &Edp, image: &str) -> Instance {
        Instance {
            instance_id: id.to_string(),
            state: InstanceState::Running,
            image_id: image.to_string(),
            private_dns_name: format!("{id}.ec2.internal"),
            tags: BTreeMap::from([
                ("environment".to_string(), edp.environment.clone()),
                ("deployment".to_string(), edp.deployment.clone()),
                ("play".to_string(), edp.play.clone()),
            ]),
        }
    }

    fn image(id: &str, tags: &[(&str, &str)]) -> Image {
        Image {
            image_id: id.to_string(),
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn source_edp() -> Edp {
        Edp::new("prod", "edx", "edxapp")
    }

    fn destination_edp() -> Edp {
        Edp::new("stage", "edx", "edxapp")
    }

    async fn fleet() -> VersionSetService {
        let repo = InMemoryInventoryRepository::new();
        repo.upsert_instance(instance("i-src", &source_edp(), "img-7")).await;
        repo.upsert_instance(instance("i-dst", &destination_edp(), "img-42"))
            .await;
        repo.upsert_image(image(
            "img-7",
            &[
                ("version:configuration", "repo abc"),
                ("version:a", "repo 1"),
                ("version:broken", "norefhere"),
            ],
        ))
        .await;
        repo.upsert_image(image(
            "img-42",
            &[("version:configuration", "repo zzz"), ("version:a", "repo 0")],
        ))
        .await;
        repo.upsert_load_balancer(LoadBalancer {
            name: "lb".to_string(),
            instance_ids: vec!["i-src".to_string(), "i-dst".to_string()],
        })
        .await;

        let inventory = Arc::new(InventoryService::new(Arc::new(repo), Duration::from_secs(1)));
        let resolver = Arc::new(EdpResolverService::new(inventory.clone()));
        VersionSetService::new(inventory, resolver)
    }

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_cut_from_edp_takes_versions_from_source_and_base_from_destination() {
        let service = fleet().await;
        let plan = service
            .plan(
                &destination_edp(),
                &BuildSource::Edp(source_edp()),
                &tokens(&["a_version=9"]),
            )
            .await
            .unwrap();

        let request = plan.request;
        assert_eq!(request.edp, destination_edp());
        assert_eq!(request.base_image_id.as_deref(), Some("img-42"));
        assert!(!request.use_blessed());
        assert_eq!(request.versions.configuration_ref, "abc");
        assert_eq!(request.versions.play_versions.as_map().get("a_version").unwrap(), "9");
        assert_eq!(request.versions.play_versions.as_map().get("A_VERSION").unwrap(), "9");
        assert_eq!(plan.defects.len(), 1);
        assert!(plan
            .notes
            .iter()
            .any(|n| n == "Overriding 'a_version' for the new ami."));
    }

    #[tokio::test]
    async fn test_cut_from_image_uses_it_as_base() {
        let service = fleet().await;
        let plan = service
            .plan(&destination_edp(), &BuildSource::Image("img-7".to_string()), &[])
            .await
            .unwrap();

        assert_eq!(plan.request.base_image_id.as_deref(), Some("img-7"));
        assert_eq!(plan.request.versions.configuration_ref, "abc");
        assert_eq!(plan.request.versions.configuration_secure_ref, "master");
        assert_eq!(plan.notes[0], "Looking up ami img-7");
    }

    #[tokio::test]
    async fn test_blessed_plan_never_touches_inventory_images() {
        let service = fleet().await;
        let plan = service
            .plan(
                &destination_edp(),
                &BuildSource::Blessed,
                &tokens(&["configuration_secure=s3cret", "x=1", "x=2"]),
            )
            .await
            .unwrap();

        assert!(plan.request.use_blessed());
        assert_eq!(plan.request.versions.configuration_ref, "master");
        assert_eq!(plan.request.versions.configuration_secure_ref, "s3cret");
        assert_eq!(plan.request.versions.play_versions.get("x"), Some("2"));
    }

    #[tokio::test]
    async fn test_malformed_override_rejected_before_lookup() {
        let service = fleet().await;
        let err = service
            .plan(
                &destination_edp(),
                &BuildSource::Image("img-missing".to_string()),
                &tokens(&["a=1", "oops"]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ControlPlaneError::MalformedOverride(ref t) if t == "oops"));
    }

    #[tokio::test]
    async fn test_missing_image_is_not_found() {
        let service = fleet().await;
        let err = service.from_image("img-missing").await.unwrap_err();
        assert!(matches!(err, ControlPlaneError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cut_from_unserved_source_fails() {
        let service = fleet().await;
        let err = service
            .plan(
                &destination_edp(),
                &BuildSource::Edp(Edp::new("prod", "edx", "forum")),
                &[],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ControlPlaneError::NoLiveImage(_)));
    }

    #[tokio::test]
    async fn test_apply_overrides_is_idempotent() {
        let service = fleet().await;
        let overrides = tokens(&["a=1", "configuration=c1", "A=2"]);

        let once = service
            .apply_overrides(service.from_blessed(), &overrides)
            .unwrap();
        let twice = service.apply_overrides(once.clone(), &overrides).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.play_versions.get("a"), Some("2"));
    }
}
