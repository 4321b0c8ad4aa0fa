//! Registry test utilities

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use semver::Version;
use serde_json::json;

use peercheck::version::error::RegistryError;
use peercheck::version::registry::Registry;
use peercheck::version::types::{Manifest, VersionSet};

/// Host every fixture is checked against
pub const HOST: &str = "host";

/// What a fixture manifest says about [`HOST`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declares {
    /// peer range satisfied by host 1.0.0
    Supported,
    /// peer range host 1.0.0 does not satisfy
    Unsupported,
    /// no mention of the host at all
    Nothing,
}

/// In-memory registry with recorded manifest fetches
#[derive(Default)]
pub struct FixtureRegistry {
    versions: HashMap<String, Vec<Version>>,
    manifests: HashMap<(String, Version), Manifest>,
    failing: HashSet<String>,
    fetched: Mutex<Vec<(String, Version)>>,
}

impl FixtureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_versions(mut self, package: &str, versions: &[&str]) -> Self {
        self.versions.insert(
            package.to_string(),
            versions.iter().map(|v| Version::parse(v).unwrap()).collect(),
        );
        self
    }

    pub fn with_manifest(mut self, package: &str, version: &str, manifest: serde_json::Value) -> Self {
        self.manifests.insert(
            (package.to_string(), Version::parse(version).unwrap()),
            serde_json::from_value(manifest).unwrap(),
        );
        self
    }

    pub fn with_peer(self, package: &str, version: &str, range: &str) -> Self {
        self.with_manifest(
            package,
            version,
            json!({ "name": package, "version": version, "peerDependencies": { HOST: range } }),
        )
    }

    pub fn with_declaration(self, package: &str, version: &str, declares: Declares) -> Self {
        match declares {
            Declares::Supported => self.with_peer(package, version, ">=1.0.0"),
            Declares::Unsupported => self.with_peer(package, version, ">=5.0.0"),
            Declares::Nothing => self.with_manifest(
                package,
                version,
                json!({ "name": package, "version": version }),
            ),
        }
    }

    /// `list_versions` for `package` fails as if the registry answered garbage
    pub fn failing(mut self, package: &str) -> Self {
        self.failing.insert(package.to_string());
        self
    }

    /// Versions whose manifest was requested, in request order
    pub fn fetched(&self) -> Vec<(String, Version)> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }
}

#[async_trait]
impl Registry for FixtureRegistry {
    async fn list_versions(&self, package_name: &str) -> Result<VersionSet, RegistryError> {
        if self.failing.contains(package_name) {
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: 502 Bad Gateway ({package_name})"
            )));
        }

        match self.versions.get(package_name) {
            Some(versions) => Ok(VersionSet::new(versions.clone())),
            None => Err(RegistryError::NotFound(package_name.to_string())),
        }
    }

    async fn fetch_manifest(
        &self,
        package_name: &str,
        version: &Version,
    ) -> Result<Manifest, RegistryError> {
        self.fetched
            .lock()
            .unwrap()
            .push((package_name.to_string(), version.clone()));

        self.manifests
            .get(&(package_name.to_string(), version.clone()))
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(format!("{package_name}@{version}")))
    }
}

/// `n` versions of `package` (`1.0.0`, `1.1.0`, ...) declaring `pattern[i]` each
pub fn patterned_registry(package: &str, pattern: &[Declares]) -> (FixtureRegistry, Vec<String>) {
    let versions: Vec<String> = (0..pattern.len()).map(|i| format!("1.{i}.0")).collect();
    let refs: Vec<&str> = versions.iter().map(String::as_str).collect();

    let registry = pattern
        .iter()
        .zip(&versions)
        .fold(
            FixtureRegistry::new().with_versions(package, &refs),
            |registry, (declares, version)| registry.with_declaration(package, version, *declares),
        );

    (registry, versions)
}
