//! Registry trait for fetching package metadata

#[cfg(test)]
use mockall::automock;
use semver::Version;

use crate::version::error::RegistryError;
use crate::version::types::{Manifest, VersionSet};

/// Read-only view of a package registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches all published versions of a package
    ///
    /// # Returns
    /// * `Ok(VersionSet)` - Versions ordered from oldest to newest
    /// * `Err(RegistryError)` - If the fetch fails or the response cannot be read
    async fn list_versions(&self, package_name: &str) -> Result<VersionSet, RegistryError>;

    /// Fetches the manifest (package.json) published for one exact version
    async fn fetch_manifest(
        &self,
        package_name: &str,
        version: &Version,
    ) -> Result<Manifest, RegistryError>;
}
