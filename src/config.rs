use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::version::registries::npm::DEFAULT_BASE_URL;

// =============================================================================
// Time-related constants
// =============================================================================

/// Timeout for a single registry request in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Wall-clock budget for resolving one dependency in milliseconds (2 minutes)
pub const DEPENDENCY_TIMEOUT_MS: u64 = 120_000;

/// Delay between starting each dependency check to avoid rate limiting (10ms)
pub const FETCH_STAGGER_DELAY_MS: u64 = 10;

/// Maximum number of registry requests in flight at once
pub const MAX_CONCURRENT_REQUESTS: usize = 8;

/// Configuration file structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckConfig {
    pub registry: RegistryConfig,
    pub fetch: FetchConfig,
}

/// Registry location
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    pub url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Request and scheduling limits
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FetchConfig {
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Upper bound on concurrent registry requests
    pub max_concurrent_requests: usize,
    /// Per-dependency timeout in milliseconds
    pub dependency_timeout_ms: u64,
    /// Delay between starting each dependency check in milliseconds
    pub stagger_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: FETCH_TIMEOUT_MS,
            max_concurrent_requests: MAX_CONCURRENT_REQUESTS,
            dependency_timeout_ms: DEPENDENCY_TIMEOUT_MS,
            stagger_delay_ms: FETCH_STAGGER_DELAY_MS,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn dependency_timeout(&self) -> Duration {
        Duration::from_millis(self.dependency_timeout_ms)
    }

    pub fn stagger_delay(&self) -> Duration {
        Duration::from_millis(self.stagger_delay_ms)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CheckConfig {
    /// Read a JSON config file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `explicit` if given, else the default config file if it exists,
    /// else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let path = config_path();
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Returns the path to the config directory for peercheck.
/// Uses $XDG_CONFIG_HOME/peercheck if XDG_CONFIG_HOME is set,
/// otherwise falls back to ~/.config/peercheck,
/// or ./peercheck if neither is available.
pub fn config_dir() -> PathBuf {
    config_dir_with_env(std::env::var("XDG_CONFIG_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the default config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

fn config_dir_with_env(xdg_config_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let config_dir = xdg_config_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));

    config_dir.join("peercheck")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn check_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<CheckConfig>(json!({
            "fetch": {
                "maxConcurrentRequests": 2
            }
        }))
        .unwrap();

        assert_eq!(result.fetch.max_concurrent_requests, 2);
        assert_eq!(result.fetch.timeout_ms, FETCH_TIMEOUT_MS);
        assert_eq!(result.registry, RegistryConfig::default());
    }

    #[test]
    fn check_config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<CheckConfig>(json!({
            "registry": { "url": "https://npm.example.com" },
            "fetch": {
                "timeoutMs": 5000,
                "maxConcurrentRequests": 4,
                "dependencyTimeoutMs": 60000,
                "staggerDelayMs": 0
            }
        }))
        .unwrap();

        assert_eq!(
            result,
            CheckConfig {
                registry: RegistryConfig {
                    url: "https://npm.example.com".to_string()
                },
                fetch: FetchConfig {
                    timeout_ms: 5000,
                    max_concurrent_requests: 4,
                    dependency_timeout_ms: 60000,
                    stagger_delay_ms: 0,
                }
            }
        );
    }

    #[test]
    fn from_file_reads_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "registry": {{ "url": "http://localhost:4873" }} }}"#).unwrap();

        let config = CheckConfig::from_file(file.path()).unwrap();

        assert_eq!(config.registry.url, "http://localhost:4873");
        assert_eq!(config.fetch, FetchConfig::default());
    }

    #[test]
    fn from_file_reports_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "registry = 1").unwrap();

        let result = CheckConfig::from_file(file.path());

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn load_with_missing_explicit_path_fails() {
        let result = CheckConfig::load(Some(Path::new("/nonexistent/peercheck.json")));

        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn config_dir_with_env_uses_xdg_config_home_when_set() {
        let path = config_dir_with_env(
            Some("/tmp/test-config".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-config/peercheck"));
    }

    #[test]
    fn config_dir_with_env_falls_back_to_home_config() {
        let path = config_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(path, PathBuf::from("/home/user/.config/peercheck"));
    }

    #[test]
    fn config_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = config_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from("./peercheck"));
    }
}
