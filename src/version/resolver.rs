//! Minimum supported version search
//!
//! Finds the lowest version of a dependency whose manifest declares a range
//! containing the host version. The version list is bisected with one
//! manifest fetch per probe:
//!
//! ```text
//!            probe(mid)
//!          /            \
//!    Supported        Unsupported / Unrelated
//!        |                    |
//!  search [0, mid)      search (mid, end)
//!  found? take it       found? take it
//!  else mid             else merge(signal(mid), upper)
//! ```
//!
//! Support is not assumed to be monotonic, so a supported midpoint still
//! sends the search into the lower half. On monotonic data this costs
//! O(log n) probes.

use futures::FutureExt;
use futures::future::BoxFuture;
use semver::Version;
use tracing::{debug, info};

use crate::version::error::CheckError;
use crate::version::probe::{ProbeResult, probe};
use crate::version::registry::Registry;
use crate::version::types::{HostTarget, VersionSet};

/// Final answer for one dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// No probed version declares the host at all
    NotApplicable,
    /// The host is declared, but no probed version's range includes it
    NoSupportedVersion,
    /// Lowest version whose declared range includes the host version
    FoundVersion(Version),
}

/// A probe that did not find support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Miss {
    Unsupported,
    Unrelated,
}

/// What one branch of the search learned
#[derive(Debug, Clone, PartialEq, Eq)]
enum SearchOutcome {
    /// Nothing probed, or every probe was Unrelated
    NoInformation,
    /// At least one probe declared the host without supporting it
    RelatedUnsupported,
    Found(Version),
}

impl SearchOutcome {
    fn from_miss(miss: Miss) -> Self {
        match miss {
            Miss::Unsupported => SearchOutcome::RelatedUnsupported,
            Miss::Unrelated => SearchOutcome::NoInformation,
        }
    }

    /// Combine two branch outcomes: a found version beats any signal,
    /// the lower found version beats a higher one, and RelatedUnsupported
    /// beats NoInformation.
    fn merge(self, other: SearchOutcome) -> SearchOutcome {
        use SearchOutcome::*;

        match (self, other) {
            (Found(a), Found(b)) => Found(a.min(b)),
            (found @ Found(_), _) | (_, found @ Found(_)) => found,
            (RelatedUnsupported, _) | (_, RelatedUnsupported) => RelatedUnsupported,
            (NoInformation, NoInformation) => NoInformation,
        }
    }

    fn into_resolution(self) -> ResolutionOutcome {
        match self {
            SearchOutcome::Found(version) => ResolutionOutcome::FoundVersion(version),
            SearchOutcome::RelatedUnsupported => ResolutionOutcome::NoSupportedVersion,
            SearchOutcome::NoInformation => ResolutionOutcome::NotApplicable,
        }
    }
}

/// Searches a dependency's published versions for host support
pub struct VersionResolver<'a> {
    registry: &'a dyn Registry,
    host: &'a HostTarget,
}

impl<'a> VersionResolver<'a> {
    pub fn new(registry: &'a dyn Registry, host: &'a HostTarget) -> Self {
        Self { registry, host }
    }

    /// Resolve `package`, only considering versions at or above `floor`
    ///
    /// Fails only when the version list itself cannot be fetched; a
    /// missing manifest for an individual version is absorbed by the probe.
    pub async fn resolve(
        &self,
        package: &str,
        floor: Option<&Version>,
    ) -> Result<ResolutionOutcome, CheckError> {
        let versions = self
            .registry
            .list_versions(package)
            .await
            .map_err(|source| CheckError::Fetch {
                package: package.to_string(),
                source,
            })?;

        let versions = match floor {
            Some(floor) => versions.with_floor(floor),
            None => versions,
        };

        debug!(
            "Searching {} versions of {} (floor: {:?})",
            versions.len(),
            package,
            floor.map(|f| f.to_string())
        );

        let outcome = self.resolve_within(package, &versions).await;
        info!("{} against {}: {:?}", package, self.host, outcome);
        Ok(outcome)
    }

    /// Run the search over an already fetched version set
    pub async fn resolve_within(&self, package: &str, versions: &VersionSet) -> ResolutionOutcome {
        self.search(package, versions.as_slice())
            .await
            .into_resolution()
    }

    fn search<'s>(&'s self, package: &'s str, versions: &'s [Version]) -> BoxFuture<'s, SearchOutcome> {
        async move {
            if versions.is_empty() {
                return SearchOutcome::NoInformation;
            }

            let mid = versions.len() / 2;
            let candidate = &versions[mid];

            match probe(self.registry, self.host, package, candidate).await {
                ProbeResult::Supported => {
                    // Look for an earlier supported version before settling on mid
                    let lower = self.search(package, &versions[..mid]).await;
                    lower.merge(SearchOutcome::Found(candidate.clone()))
                }
                ProbeResult::Unsupported => {
                    let upper = self.search(package, &versions[mid + 1..]).await;
                    SearchOutcome::from_miss(Miss::Unsupported).merge(upper)
                }
                ProbeResult::Unrelated => {
                    let upper = self.search(package, &versions[mid + 1..]).await;
                    SearchOutcome::from_miss(Miss::Unrelated).merge(upper)
                }
            }
        }
        .boxed()
    }
}
