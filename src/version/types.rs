//! Common types shared by the registry, probe and resolver layers

use std::fmt;

use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Deserializer};

use crate::version::error::CheckError;
use crate::version::semver::coerce;

/// The package whose support is being checked for, pinned to one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTarget {
    pub name: String,
    pub version: Version,
}

impl HostTarget {
    /// Builds a target from a loosely formatted version ("0.6" -> 0.6.0).
    pub fn new(name: impl Into<String>, raw_version: &str) -> Result<Self, CheckError> {
        let version =
            coerce(raw_version).ok_or_else(|| CheckError::InvalidVersion(raw_version.to_string()))?;
        Ok(Self {
            name: name.into(),
            version,
        })
    }
}

impl fmt::Display for HostTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Published versions of one package, ascending by semver precedence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSet {
    versions: Vec<Version>,
}

impl VersionSet {
    pub fn new(mut versions: Vec<Version>) -> Self {
        versions.sort();
        versions.dedup();
        Self { versions }
    }

    /// Keeps only versions strictly above `floor` and puts `floor` first.
    ///
    /// The floor is a valid candidate even when the registry never
    /// published it as such (e.g. `^1.2` normalised to 1.2.0).
    pub fn with_floor(self, floor: &Version) -> Self {
        let mut versions = Vec::with_capacity(self.versions.len() + 1);
        versions.push(floor.clone());
        versions.extend(self.versions.into_iter().filter(|v| v > floor));
        Self { versions }
    }

    pub fn as_slice(&self) -> &[Version] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// Declared metadata of a package at one version (its package.json)
///
/// Dependency slots are read leniently: anything that is not an object of
/// strings is ignored instead of failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Manifest {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub version: Option<String>,
    #[serde(deserialize_with = "lenient_map")]
    pub dependencies: IndexMap<String, String>,
    #[serde(deserialize_with = "lenient_map")]
    pub dev_dependencies: IndexMap<String, String>,
    #[serde(deserialize_with = "lenient_map")]
    pub peer_dependencies: IndexMap<String, String>,
}

impl Manifest {
    /// Range declared for `package`, peer slot first, then dev slot.
    ///
    /// Blank entries count as undeclared.
    pub fn declared_range(&self, package: &str) -> Option<&str> {
        fn lookup<'m>(slot: &'m IndexMap<String, String>, package: &str) -> Option<&'m str> {
            slot.get(package)
                .map(String::as_str)
                .filter(|range| !range.trim().is_empty())
        }

        lookup(&self.peer_dependencies, package)
            .or_else(|| lookup(&self.dev_dependencies, package))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientSlot {
    Map(IndexMap<String, serde_json::Value>),
    Other(serde::de::IgnoredAny),
}

fn lenient_map<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match LenientSlot::deserialize(deserializer)? {
        LenientSlot::Map(entries) => entries,
        LenientSlot::Other(_) => return Ok(IndexMap::new()),
    };

    Ok(entries
        .into_iter()
        .filter_map(|(name, value)| match value {
            serde_json::Value::String(range) => Some((name, range)),
            _ => None,
        })
        .collect())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(value) => Some(value),
        _ => None,
    })
}
