use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by a compatibility check.
///
/// `InvalidVersion` and `Manifest` abort the whole invocation. `Fetch` and
/// `Timeout` are scoped to a single dependency and reported next to the
/// results of its siblings.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Invalid version: {0:?} cannot be read as a semantic version")]
    InvalidVersion(String),

    #[error("Failed to fetch versions of {package}: {source}")]
    Fetch {
        package: String,
        #[source]
        source: RegistryError,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Timed out after {elapsed_ms}ms while checking {package}")]
    Timeout { package: String, elapsed_ms: u64 },
}
