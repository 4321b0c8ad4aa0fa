//! Invocation modes: which dependencies to check and where their floors come from

use std::path::PathBuf;

use tracing::debug;

use crate::manifest::load_manifest;
use crate::scan::{DependencyReport, DependencyScanner, ScanOptions};
use crate::version::error::CheckError;
use crate::version::registry::Registry;
use crate::version::types::HostTarget;

/// What a single invocation checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckMode {
    /// Every entry of the host manifest's `dependencies`
    AllDependencies { manifest: PathBuf },
    /// One package. With a manifest, its declared range there sets the floor;
    /// without one, every published version is a candidate.
    Single {
        package: String,
        manifest: Option<PathBuf>,
    },
}

/// Run one check and collect a report per dependency
///
/// Errors here abort the invocation (the host manifest could not be read);
/// per-dependency failures are carried inside the reports.
pub async fn run_check(
    registry: &dyn Registry,
    host: &HostTarget,
    mode: &CheckMode,
    options: ScanOptions,
) -> Result<Vec<DependencyReport>, CheckError> {
    let scanner = DependencyScanner::new(registry, host, options);

    match mode {
        CheckMode::AllDependencies { manifest } => {
            let manifest = load_manifest(manifest)?;
            Ok(scanner.scan_all(&manifest.dependencies).await)
        }
        CheckMode::Single {
            package,
            manifest: Some(path),
        } => {
            let manifest = load_manifest(path)?;
            let declared = manifest.dependencies.get(package).map(String::as_str);
            if declared.is_none() {
                debug!("{} is not listed in {}", package, path.display());
            }
            Ok(vec![scanner.scan_one(package, declared).await])
        }
        CheckMode::Single {
            package,
            manifest: None,
        } => Ok(vec![scanner.scan_one(package, None).await]),
    }
}
