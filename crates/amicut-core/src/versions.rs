//! Version sets and the override merge rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{CoreError, Result};

pub const CONFIGURATION_KEY: &str = "configuration";
pub const CONFIGURATION_SECURE_KEY: &str = "configuration_secure";
pub const DEFAULT_REF: &str = "master";

/// Play variables keyed by name.
///
/// Every key is stored twice, lower-cased and upper-cased, with the same
/// value. The build pipeline reads `vars` verbatim and some plays expect the
/// upper-case spelling, so both literal keys are kept on the wire. Lookups
/// through [`PlayVersions::get`] accept any casing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayVersions(BTreeMap<String, String>);

impl PlayVersions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        self.0.insert(key.to_uppercase(), value.clone());
        self.0.insert(key.to_lowercase(), value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .or_else(|| self.0.get(&key.to_lowercase()))
            .or_else(|| self.0.get(&key.to_uppercase()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All stored entries, both casings included, sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries whose key is already lower-case, one per logical variable.
    pub fn lowercase_entries(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .filter(|(k, _)| **k == k.to_lowercase())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

impl FromIterator<(String, String)> for PlayVersions {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut versions = PlayVersions::new();
        for (key, value) in iter {
            versions.insert(&key, value);
        }
        versions
    }
}

/// Release metadata for one image: the two configuration refs and the play variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSet {
    pub configuration_ref: String,
    pub configuration_secure_ref: String,
    pub play_versions: PlayVersions,
}

impl Default for VersionSet {
    fn default() -> Self {
        Self::blessed()
    }
}

impl VersionSet {
    /// The implicit base used when no image is given: `master`/`master`, no play variables.
    pub fn blessed() -> Self {
        Self {
            configuration_ref: DEFAULT_REF.to_string(),
            configuration_secure_ref: DEFAULT_REF.to_string(),
            play_versions: PlayVersions::new(),
        }
    }

    pub fn apply(&mut self, item: &Override) {
        match item.key.as_str() {
            CONFIGURATION_KEY => self.configuration_ref = item.value.clone(),
            CONFIGURATION_SECURE_KEY => self.configuration_secure_ref = item.value.clone(),
            key => self.play_versions.insert(key, item.value.clone()),
        }
    }

    /// Applies overrides in order; a later override for the same key wins.
    pub fn with_overrides(mut self, overrides: &[Override]) -> Self {
        for item in overrides {
            self.apply(item);
        }
        self
    }

    /// Parses every token before touching the set, so a malformed token
    /// rejects the whole batch.
    pub fn with_override_tokens<S: AsRef<str>>(self, tokens: &[S]) -> Result<Self> {
        let overrides = parse_overrides(tokens)?;
        Ok(self.with_overrides(&overrides))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub key: String,
    pub value: String,
}

impl Override {
    /// Splits a `key=value` token on its first `=`.
    pub fn parse(token: &str) -> Result<Self> {
        match token.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok(Self {
                key: key.to_string(),
                value: value.to_string(),
            }),
            _ => Err(CoreError::MalformedOverride(token.to_string())),
        }
    }
}

pub fn parse_overrides<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Override>> {
    tokens.iter().map(|t| Override::parse(t.as_ref())).collect()
}
