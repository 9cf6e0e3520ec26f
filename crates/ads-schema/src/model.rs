//! Schema pack model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Cache key for a pack: API domain plus version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackKey {
    pub domain: String,
    pub version: String,
}

impl PackKey {
    pub fn new(domain: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.version)
    }
}

/// Capability description of one API domain at one version.
///
/// A param may be listed under the same endpoint key in both
/// `endpoint_params` and `deprecated_params`; the lists are independent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaPack {
    pub domain: String,
    pub version: String,
    /// Entity name → allowed read fields, in declaration order
    #[serde(default)]
    pub entities: BTreeMap<String, Vec<String>>,
    /// `entity.method` → accepted parameters
    #[serde(default)]
    pub endpoint_params: BTreeMap<String, Vec<String>>,
    /// `entity.method` → accepted but deprecated parameters
    #[serde(default)]
    pub deprecated_params: BTreeMap<String, Vec<String>>,
}

impl SchemaPack {
    /// Create an empty pack
    pub fn new(domain: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            version: version.into(),
            entities: BTreeMap::new(),
            endpoint_params: BTreeMap::new(),
            deprecated_params: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_entity<I, S>(mut self, entity: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities
            .insert(entity.into(), fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_endpoint<I, S>(mut self, key: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.endpoint_params
            .insert(key.into(), params.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_deprecated<I, S>(mut self, key: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deprecated_params
            .insert(key.into(), params.into_iter().map(Into::into).collect());
        self
    }

    pub fn key(&self) -> PackKey {
        PackKey::new(&self.domain, &self.version)
    }

    pub fn has_entity(&self, entity: &str) -> bool {
        self.entities.contains_key(entity)
    }

    /// Allowed read fields for an entity
    pub fn entity_fields(&self, entity: &str) -> Option<&[String]> {
        self.entities.get(entity).map(Vec::as_slice)
    }

    /// Accepted parameters for an endpoint key
    pub fn endpoint_params(&self, key: &str) -> Option<&[String]> {
        self.endpoint_params.get(key).map(Vec::as_slice)
    }

    /// Deprecated parameters for an endpoint key
    pub fn deprecated_params(&self, key: &str) -> Option<&[String]> {
        self.deprecated_params.get(key).map(Vec::as_slice)
    }

    /// Endpoint keys declared for an entity (`ad.get`, `ad.post`, ...)
    pub fn endpoints_for(&self, entity: &str) -> Vec<&str> {
        let prefix = format!("{entity}.");
        self.endpoint_params
            .keys()
            .chain(self.deprecated_params.keys())
            .filter(|k| k.starts_with(&prefix))
            .map(String::as_str)
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
