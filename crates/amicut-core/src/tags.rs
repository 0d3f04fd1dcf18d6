//! Conversion between image tags and [`VersionSet`]s.
//!
//! Release metadata lives on images as tags named `version:<component>` whose
//! value reads `"<description> <ref>"`. Only the second whitespace token is
//! the ref. `configuration` and `configuration_secure` feed the two
//! configuration refs; every other component becomes the play variable
//! `<component>_version`.

use std::collections::BTreeMap;

use crate::versions::{PlayVersions, VersionSet, CONFIGURATION_KEY, CONFIGURATION_SECURE_KEY};
use crate::{CoreError, Result};

pub const VERSION_TAG_PREFIX: &str = "version:";
pub const PLAY_VARIABLE_SUFFIX: &str = "_version";

/// A `version:` tag whose value carries no ref token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDefect {
    pub tag: String,
    pub value: String,
}

impl std::fmt::Display for TagDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tag '{}' has no ref in value '{}'", self.tag, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedVersions {
    pub versions: VersionSet,
    pub defects: Vec<TagDefect>,
}

/// One well-formed `version:` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag<'a> {
    pub component: &'a str,
    pub git_ref: &'a str,
}

/// Walks the `version:` tags of an image. Tags without a ref token are
/// returned as defects instead of failing the whole image.
pub fn version_tags(tags: &BTreeMap<String, String>) -> (Vec<VersionTag<'_>>, Vec<TagDefect>) {
    let mut found = Vec::new();
    let mut defects = Vec::new();

    for (tag, value) in tags {
        let Some(component) = tag.strip_prefix(VERSION_TAG_PREFIX) else {
            continue;
        };
        match value.split_whitespace().nth(1) {
            Some(git_ref) => found.push(VersionTag {
                component: component.trim(),
                git_ref,
            }),
            None => defects.push(TagDefect {
                tag: tag.clone(),
                value: value.clone(),
            }),
        }
    }

    (found, defects)
}

pub fn decode(tags: &BTreeMap<String, String>) -> DecodedVersions {
    let (found, defects) = version_tags(tags);

    let mut versions = VersionSet::blessed();
    for tag in found {
        match tag.component {
            CONFIGURATION_KEY => versions.configuration_ref = tag.git_ref.to_string(),
            CONFIGURATION_SECURE_KEY => {
                versions.configuration_secure_ref = tag.git_ref.to_string()
            }
            component => versions
                .play_versions
                .insert(&format!("{component}{PLAY_VARIABLE_SUFFIX}"), tag.git_ref),
        }
    }

    for defect in &defects {
        tracing::warn!(tag = %defect.tag, value = %defect.value, "Skipping version tag without a ref");
    }

    DecodedVersions { versions, defects }
}

/// `component=ref` pairs for display, in tag order.
pub fn version_refs(tags: &BTreeMap<String, String>) -> Vec<String> {
    version_tags(tags)
        .0
        .into_iter()
        .map(|tag| format!("{}={}", tag.component, tag.git_ref))
        .collect()
}

/// Serializes play variables as a YAML block mapping, keys sorted.
pub fn encode(versions: &PlayVersions) -> Result<String> {
    serde_yaml::to_string(versions.as_map()).map_err(|e| CoreError::Serialization(e.to_string()))
}

/// Reads back a block produced by [`encode`].
pub fn parse_vars(block: &str) -> Result<PlayVersions> {
    let map: BTreeMap<String, String> =
        serde_yaml::from_str(block).map_err(|e| CoreError::Serialization(e.to_string()))?;
    Ok(map.into_iter().collect())
}
