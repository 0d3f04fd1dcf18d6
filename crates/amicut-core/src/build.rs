//! Build requests sent to the image build trigger.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::tags;
use crate::versions::{PlayVersions, VersionSet};
use crate::{CoreError, Edp, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub edp: Edp,
    pub versions: VersionSet,
    pub base_image_id: Option<String>,
}

/// Ordered `name=value` parameters as they go on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildParams(Vec<(String, String)>);

impl BuildParams {
    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.0.push((name.to_string(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Serialize)]
struct DisplayParams<'a> {
    play: &'a str,
    deployment: &'a str,
    environment: &'a str,
    vars: &'a PlayVersions,
    configuration: &'a str,
    configuration_secure: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_ami: Option<&'a str>,
    use_blessed: bool,
}

#[derive(Serialize)]
struct DisplayEnvelope<'a> {
    #[serde(rename = "Params")]
    params: DisplayParams<'a>,
}

impl BuildRequest {
    pub fn new(edp: Edp, versions: VersionSet, base_image_id: Option<String>) -> Self {
        Self {
            edp,
            versions,
            base_image_id,
        }
    }

    /// Blessed builds start from the pipeline's default image.
    pub fn use_blessed(&self) -> bool {
        self.base_image_id.is_none()
    }

    pub fn params(&self) -> Result<BuildParams> {
        let mut params = BuildParams::default();
        params.push("play", self.edp.play.clone());
        params.push("deployment", self.edp.deployment.clone());
        params.push("environment", self.edp.environment.clone());
        params.push("vars", tags::encode(&self.versions.play_versions)?);
        params.push("configuration", self.versions.configuration_ref.clone());
        params.push(
            "configuration_secure",
            self.versions.configuration_secure_ref.clone(),
        );
        if let Some(base) = &self.base_image_id {
            params.push("base_ami", base.clone());
        }
        params.push("use_blessed", self.use_blessed().to_string());
        Ok(params)
    }

    /// Operator-facing summary. Verbose output adds the base image and the
    /// full parameter set with `vars` shown as a mapping.
    pub fn summary(&self, verbose: bool) -> Result<String> {
        let mut output = format!("Building ami for {}\n", self.edp);
        if !verbose {
            return Ok(output);
        }

        if let Some(base) = &self.base_image_id {
            output.push_str(&format!("With base ami: {base}\n"));
        }
        let envelope = DisplayEnvelope {
            params: DisplayParams {
                play: &self.edp.play,
                deployment: &self.edp.deployment,
                environment: &self.edp.environment,
                vars: &self.versions.play_versions,
                configuration: &self.versions.configuration_ref,
                configuration_secure: &self.versions.configuration_secure_ref,
                base_ami: self.base_image_id.as_deref(),
                use_blessed: self.use_blessed(),
            },
        };
        let rendered =
            serde_yaml::to_string(&envelope).map_err(|e| CoreError::Serialization(e.to_string()))?;
        output.push_str(&rendered);
        Ok(output)
    }

    /// Lower-case play variables, one per logical key.
    pub fn logical_vars(&self) -> BTreeMap<String, String> {
        self.versions.play_versions.lowercase_entries()
    }
}
