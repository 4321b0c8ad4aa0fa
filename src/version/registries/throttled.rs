//! Concurrency limit for outbound registry requests

use semver::Version;
use tokio::sync::Semaphore;
use tracing::trace;

use crate::version::error::RegistryError;
use crate::version::registry::Registry;
use crate::version::types::{Manifest, VersionSet};

/// Wraps a registry so that at most `max_in_flight` requests run at once
pub struct ThrottledRegistry<R> {
    inner: R,
    permits: Semaphore,
}

impl<R: Registry> ThrottledRegistry<R> {
    pub fn new(inner: R, max_in_flight: usize) -> Self {
        Self {
            inner,
            permits: Semaphore::new(max_in_flight.max(1)),
        }
    }
}

#[async_trait::async_trait]
impl<R: Registry> Registry for ThrottledRegistry<R> {
    async fn list_versions(&self, package_name: &str) -> Result<VersionSet, RegistryError> {
        let _permit = self.permits.acquire().await;
        trace!("list_versions {} (permits left: {})", package_name, self.permits.available_permits());
        self.inner.list_versions(package_name).await
    }

    async fn fetch_manifest(
        &self,
        package_name: &str,
        version: &Version,
    ) -> Result<Manifest, RegistryError> {
        let _permit = self.permits.acquire().await;
        trace!("fetch_manifest {}@{}", package_name, version);
        self.inner.fetch_manifest(package_name, version).await
    }
}
