//! Compatibility probe: one manifest checked against the host version

use semver::Version;
use tracing::{debug, warn};

use crate::version::registry::Registry;
use crate::version::semver::satisfies;
use crate::version::types::{HostTarget, Manifest};

/// Outcome of checking one dependency version against the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// The declared range includes the host version
    Supported,
    /// A range is declared but the host version falls outside it
    Unsupported,
    /// No range for the host is declared (or the manifest is unavailable)
    Unrelated,
}

/// Classify a manifest against the host target
pub fn classify(manifest: &Manifest, host: &HostTarget) -> ProbeResult {
    match manifest.declared_range(&host.name) {
        None => ProbeResult::Unrelated,
        Some(range) if satisfies(&host.version, range) => ProbeResult::Supported,
        Some(_) => ProbeResult::Unsupported,
    }
}

/// Fetch `package@version`'s manifest and classify it
///
/// A manifest that cannot be fetched carries no information and is
/// reported as `Unrelated`; the error is logged, never propagated.
pub async fn probe(
    registry: &dyn Registry,
    host: &HostTarget,
    package: &str,
    version: &Version,
) -> ProbeResult {
    let manifest = match registry.fetch_manifest(package, version).await {
        Ok(manifest) => manifest,
        Err(e) => {
            warn!("Could not load manifest for {}@{}: {}", package, version, e);
            return ProbeResult::Unrelated;
        }
    };

    let result = classify(&manifest, host);
    debug!("{}@{} against {}: {:?}", package, version, host, result);
    result
}
