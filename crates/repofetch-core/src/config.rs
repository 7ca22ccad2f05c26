//! Centralized configuration for repofetch.
//!
//! Fixed protocol constants live on [`NetworkConfig`]. The user-facing option
//! surface (repositories, indexes, environment trust, retry budget) is
//! [`RepoOptions`], which deserializes from kebab-case JSON.

use crate::network::RetryPolicy;
use crate::{FetchError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const USER_AGENT: &'static str = concat!("repofetch/", env!("CARGO_PKG_VERSION"));
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
    pub const READ_TIMEOUT: Duration = Duration::from_secs(30);
    pub const MAX_RETRIES: u32 = 5;
    pub const MAX_REDIRECTS: usize = 10;
    pub const CONNECT_RETRY_BASE_DELAY: Duration = Duration::from_millis(200);
    pub const CONNECT_RETRY_MAX_DELAY: Duration = Duration::from_secs(10);
    pub const READ_CHUNK_SIZE: usize = 8192;
    /// Upper bound on buffer capacity reserved from a declared content length.
    pub const MAX_PREALLOCATION: usize = 1024 * 1024;
    pub const DEFAULT_INDEX: &'static str = "https://pypi.org/simple/";
}

/// Options consumed from the surrounding build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RepoOptions {
    /// Direct repository base URLs, searched first.
    pub repos: Vec<String>,
    /// Package-index base URLs, searched after direct repos.
    pub indexes: Vec<String>,
    /// Whether the HTTP session inherits proxy settings from the environment.
    pub trust_env: bool,
    /// Whether TLS certificates are verified.
    pub verify: bool,
    pub max_retries: u32,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for RepoOptions {
    fn default() -> Self {
        Self {
            repos: Vec::new(),
            indexes: vec![NetworkConfig::DEFAULT_INDEX.to_string()],
            trust_env: false,
            verify: true,
            max_retries: NetworkConfig::MAX_RETRIES,
            connect_timeout_secs: NetworkConfig::CONNECT_TIMEOUT.as_secs(),
            read_timeout_secs: NetworkConfig::READ_TIMEOUT.as_secs(),
        }
    }
}

impl RepoOptions {
    /// Parse options from a JSON document. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            FetchError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    /// Build the retry policy described by these options.
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        RetryPolicy::new()
            .with_max_retries(self.max_retries)
            .with_timeouts(
                Duration::from_secs(self.connect_timeout_secs),
                Duration::from_secs(self.read_timeout_secs),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RepoOptions::default();
        assert!(options.repos.is_empty());
        assert_eq!(options.indexes, vec!["https://pypi.org/simple/".to_string()]);
        assert!(!options.trust_env);
        assert!(options.verify);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options = RepoOptions::from_json_str(
            r#"{"repos": ["https://wheels.example.com/"], "trust-env": true}"#,
        )
        .unwrap();
        assert_eq!(options.repos, vec!["https://wheels.example.com/"]);
        assert_eq!(options.indexes, vec![NetworkConfig::DEFAULT_INDEX]);
        assert!(options.trust_env);
        assert_eq!(options.max_retries, NetworkConfig::MAX_RETRIES);
    }

    #[test]
    fn test_default_policy_uses_protocol_timeouts() {
        let policy = RepoOptions::default().retry_policy().unwrap();
        assert_eq!(policy.connect_timeout(), Duration::from_secs(15));
        assert_eq!(policy.read_timeout(), Duration::from_secs(30));
        assert_eq!(policy.max_retries(), 5);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let options = RepoOptions {
            read_timeout_secs: 0,
            ..RepoOptions::default()
        };
        assert!(matches!(
            options.retry_policy(),
            Err(FetchError::Config { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repos.json");
        std::fs::write(&path, r#"{"indexes": [], "max-retries": 0}"#).unwrap();

        let options = RepoOptions::load(&path).unwrap();
        assert!(options.indexes.is_empty());
        assert_eq!(options.max_retries, 0);

        assert!(RepoOptions::load(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_user_agent_identifies_crate() {
        assert!(NetworkConfig::USER_AGENT.starts_with("repofetch/"));
    }
}
