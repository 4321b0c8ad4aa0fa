//! Dependency scanner: runs the resolver for every dependency of the host

use std::time::Duration;

use futures::future::join_all;
use indexmap::IndexMap;
use semver::Version;
use tokio::time::{sleep, timeout};
use tracing::{error, info};

use crate::config::{DEPENDENCY_TIMEOUT_MS, FETCH_STAGGER_DELAY_MS, FetchConfig};
use crate::version::error::CheckError;
use crate::version::registry::Registry;
use crate::version::resolver::{ResolutionOutcome, VersionResolver};
use crate::version::semver::minimum_of;
use crate::version::types::HostTarget;

/// Scheduling policy for a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Wall-clock budget for resolving a single dependency
    pub dependency_timeout: Duration,
    /// Delay between starting consecutive dependency checks
    pub stagger_delay: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            dependency_timeout: Duration::from_millis(DEPENDENCY_TIMEOUT_MS),
            stagger_delay: Duration::from_millis(FETCH_STAGGER_DELAY_MS),
        }
    }
}

impl From<&FetchConfig> for ScanOptions {
    fn from(config: &FetchConfig) -> Self {
        Self {
            dependency_timeout: config.dependency_timeout(),
            stagger_delay: config.stagger_delay(),
        }
    }
}

/// Result of checking one dependency
#[derive(Debug)]
pub struct DependencyReport {
    pub name: String,
    /// Range declared by the host manifest, if the check was manifest-driven
    pub declared: Option<String>,
    /// Version the search started from, derived from `declared`
    pub floor: Option<Version>,
    pub outcome: Result<ResolutionOutcome, CheckError>,
}

impl DependencyReport {
    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }
}

pub struct DependencyScanner<'a> {
    registry: &'a dyn Registry,
    host: &'a HostTarget,
    options: ScanOptions,
}

impl<'a> DependencyScanner<'a> {
    pub fn new(registry: &'a dyn Registry, host: &'a HostTarget, options: ScanOptions) -> Self {
        Self {
            registry,
            host,
            options,
        }
    }

    /// Check a single dependency
    ///
    /// `declared` is the range the host manifest gives for it; its minimum
    /// becomes the search floor. A range with no minimum (`latest`, a git
    /// URL) searches every published version.
    pub async fn scan_one(&self, name: &str, declared: Option<&str>) -> DependencyReport {
        let floor = declared.and_then(minimum_of);
        let resolver = VersionResolver::new(self.registry, self.host);

        let outcome = match timeout(
            self.options.dependency_timeout,
            resolver.resolve(name, floor.as_ref()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CheckError::Timeout {
                package: name.to_string(),
                elapsed_ms: self.options.dependency_timeout.as_millis() as u64,
            }),
        };

        if let Err(e) = &outcome {
            error!("Failed to check {}: {}", name, e);
        }

        DependencyReport {
            name: name.to_string(),
            declared: declared.map(str::to_string),
            floor,
            outcome,
        }
    }

    /// Check every dependency concurrently
    ///
    /// Starts are staggered to avoid bursts against the registry. A failure
    /// in one dependency is reported in its own entry and never cancels the
    /// others. Reports come back in manifest order.
    pub async fn scan_all(&self, dependencies: &IndexMap<String, String>) -> Vec<DependencyReport> {
        info!(
            "Checking {} dependencies against {}",
            dependencies.len(),
            self.host
        );

        let futures = dependencies
            .iter()
            .enumerate()
            .map(|(i, (name, declared))| {
                let delay = self.options.stagger_delay * i as u32;
                async move {
                    sleep(delay).await;
                    self.scan_one(name, Some(declared.as_str())).await
                }
            });

        join_all(futures).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::error::RegistryError;
    use crate::version::registry::MockRegistry;
    use crate::version::types::{Manifest, VersionSet};

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn options() -> ScanOptions {
        ScanOptions {
            dependency_timeout: Duration::from_secs(5),
            stagger_delay: Duration::ZERO,
        }
    }

    fn host() -> HostTarget {
        HostTarget::new("host", "1.0.0").unwrap()
    }

    #[tokio::test]
    async fn scan_all_isolates_fetch_failures() {
        let mut registry = MockRegistry::new();
        registry
            .expect_list_versions()
            .withf(|name| name == "broken")
            .returning(|_| Err(RegistryError::InvalidResponse("boom".to_string())));
        registry
            .expect_list_versions()
            .withf(|name| name == "dep")
            .returning(|_| Ok(VersionSet::new(vec![v("1.0.0"), v("2.0.0")])));
        registry.expect_fetch_manifest().returning(|_, _| {
            Ok(serde_json::from_str(r#"{ "peerDependencies": { "host": "^1.0.0" } }"#).unwrap())
        });
        let host = host();

        let dependencies = IndexMap::from([
            ("broken".to_string(), "^1.0.0".to_string()),
            ("dep".to_string(), "^1.0.0".to_string()),
        ]);
        let reports = DependencyScanner::new(&registry, &host, options())
            .scan_all(&dependencies)
            .await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].name, "broken");
        assert!(matches!(reports[0].outcome, Err(CheckError::Fetch { .. })));
        assert_eq!(reports[1].name, "dep");
        assert_eq!(
            reports[1].outcome.as_ref().unwrap(),
            &ResolutionOutcome::FoundVersion(v("1.0.0"))
        );
    }

    #[tokio::test]
    async fn scan_one_derives_floor_from_declared_range() {
        let mut registry = MockRegistry::new();
        registry
            .expect_list_versions()
            .returning(|_| Ok(VersionSet::new(vec![v("1.0.0"), v("1.1.0"), v("1.2.0")])));
        registry
            .expect_fetch_manifest()
            .withf(|_, version| *version >= Version::new(1, 1, 0))
            .returning(|_, _| {
                Ok(serde_json::from_str(r#"{ "peerDependencies": { "host": "*" } }"#).unwrap())
            });
        let host = host();

        let report = DependencyScanner::new(&registry, &host, options())
            .scan_one("dep", Some("^1.1.0"))
            .await;

        assert_eq!(report.floor, Some(v("1.1.0")));
        assert_eq!(report.declared.as_deref(), Some("^1.1.0"));
        assert_eq!(
            report.outcome.unwrap(),
            ResolutionOutcome::FoundVersion(v("1.1.0"))
        );
    }

    #[tokio::test]
    async fn scan_one_without_usable_range_searches_everything() {
        let mut registry = MockRegistry::new();
        registry
            .expect_list_versions()
            .returning(|_| Ok(VersionSet::new(vec![v("0.1.0"), v("0.2.0")])));
        registry
            .expect_fetch_manifest()
            .returning(|_, _| Ok(Manifest::default()));
        let host = host();

        let report = DependencyScanner::new(&registry, &host, options())
            .scan_one("dep", Some("github:owner/dep"))
            .await;

        assert_eq!(report.floor, None);
        assert_eq!(report.outcome.unwrap(), ResolutionOutcome::NotApplicable);
    }

    /// Registry that never answers in time
    struct StalledRegistry;

    #[async_trait::async_trait]
    impl Registry for StalledRegistry {
        async fn list_versions(&self, _package_name: &str) -> Result<VersionSet, RegistryError> {
            sleep(Duration::from_secs(30)).await;
            Ok(VersionSet::default())
        }

        async fn fetch_manifest(
            &self,
            package_name: &str,
            _version: &Version,
        ) -> Result<Manifest, RegistryError> {
            Err(RegistryError::NotFound(package_name.to_string()))
        }
    }

    #[tokio::test]
    async fn scan_one_times_out() {
        let host = host();
        let options = ScanOptions {
            dependency_timeout: Duration::from_millis(20),
            stagger_delay: Duration::ZERO,
        };

        let report = DependencyScanner::new(&StalledRegistry, &host, options)
            .scan_one("slow", None)
            .await;

        assert!(report.is_error());
        assert!(matches!(
            report.outcome,
            Err(CheckError::Timeout { ref package, elapsed_ms: 20 }) if package == "slow"
        ));
    }

    #[tokio::test]
    async fn scan_all_with_no_dependencies_is_empty() {
        let mut registry = MockRegistry::new();
        registry.expect_list_versions().times(0);
        let host = host();

        let reports = DependencyScanner::new(&registry, &host, options())
            .scan_all(&IndexMap::new())
            .await;

        assert!(reports.is_empty());
    }
}
