//! npm registry API implementation

use std::collections::HashMap;
use std::time::Duration;

use crate::version::error::RegistryError;
use crate::version::registry::Registry;
use crate::version::types::{Manifest, VersionSet};
use semver::Version;
use serde::Deserialize;
use tracing::{debug, warn};

/// Default base URL for npm registry
pub const DEFAULT_BASE_URL: &str = "https://registry.npmjs.org";

/// Response from npm registry API (the "packument")
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    #[serde(default)]
    versions: HashMap<String, serde_json::Value>,
}

/// Registry implementation for npm registry API
#[derive(Clone)]
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a new NpmRegistry against `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("peercheck/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Encode package name for URL (handles scoped packages)
    fn encode_package_name(package_name: &str) -> String {
        if package_name.starts_with('@') {
            // Scoped package: @scope/name -> @scope%2Fname
            package_name.replace('/', "%2F")
        } else {
            package_name.to_string()
        }
    }

    /// GET `url` and map non-success statuses onto registry errors
    async fn get(&self, url: &str, subject: &str) -> Result<reqwest::Response, RegistryError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(subject.to_string()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok());
            warn!("npm registry rate limited request: {}", url);
            return Err(RegistryError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            warn!("npm registry returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl Registry for NpmRegistry {
    async fn list_versions(&self, package_name: &str) -> Result<VersionSet, RegistryError> {
        let encoded_name = Self::encode_package_name(package_name);
        let url = format!("{}/{}", self.base_url, encoded_name);

        let response = self.get(&url, package_name).await?;

        let package_info: NpmPackageResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse npm registry response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        let versions: Vec<Version> = package_info
            .versions
            .into_keys()
            .filter_map(|v| Version::parse(&v).ok())
            .collect();

        // VersionSet sorts by semver (lowest first, highest last)
        Ok(VersionSet::new(versions))
    }

    async fn fetch_manifest(
        &self,
        package_name: &str,
        version: &Version,
    ) -> Result<Manifest, RegistryError> {
        let encoded_name = Self::encode_package_name(package_name);
        let url = format!("{}/{}/{}", self.base_url, encoded_name, version);

        let response = self
            .get(&url, &format!("{}@{}", package_name, version))
            .await?;

        response.json::<Manifest>().await.map_err(|e| {
            warn!("Failed to parse manifest for {}@{}: {}", package_name, version, e);
            RegistryError::InvalidResponse(e.to_string())
        })
    }
}
