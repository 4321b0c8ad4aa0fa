//! Host manifest reader
//!
//! Reads the package.json of the project being checked. Only its
//! `dependencies` slot feeds the scan; each entry's declared range becomes
//! the floor for that dependency's search.

use std::path::Path;

use tracing::debug;

use crate::version::error::ManifestError;
use crate::version::types::Manifest;

/// Default manifest location, relative to the working directory
pub const DEFAULT_MANIFEST_PATH: &str = "package.json";

/// Read and parse a package.json from disk
pub fn load_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let manifest: Manifest = serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    debug!(
        "Loaded {} with {} dependencies",
        path.display(),
        manifest.dependencies.len()
    );
    Ok(manifest)
}
