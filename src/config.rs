//! Configuration Management
//!
//! Handles persistent configuration storage for glrest.

use crate::gitlab::auth::Credentials;
use crate::gitlab::client::DEFAULT_URL;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the instance URL
pub const URL_ENV: &str = "GITLAB_URL";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// GitLab instance URL
    #[serde(default)]
    pub url: Option<String>,
    /// Personal/project access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_token: Option<String>,
    /// OAuth2 access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_token: Option<String>,
    /// CI job token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_token: Option<String>,
    /// Default page size for list calls
    #[serde(default)]
    pub per_page: Option<u32>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Verify TLS certificates (default true)
    #[serde(default)]
    pub ssl_verify: Option<bool>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("glrest").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific file; missing or invalid files yield defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective URL (environment > config > gitlab.com)
    pub fn effective_url(&self) -> String {
        std::env::var(URL_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.url.clone())
            .unwrap_or_else(|| DEFAULT_URL.to_string())
    }

    /// Get effective credentials (environment > config > anonymous)
    pub fn effective_credentials(&self) -> Credentials {
        let from_env = Credentials::from_env();
        if !from_env.is_anonymous() {
            return from_env;
        }
        self.configured_credentials()
    }

    /// Credentials stored in the file alone
    pub fn configured_credentials(&self) -> Credentials {
        if let Some(token) = &self.private_token {
            Credentials::PrivateToken(token.clone())
        } else if let Some(token) = &self.oauth_token {
            Credentials::OAuthToken(token.clone())
        } else if let Some(token) = &self.job_token {
            Credentials::JobToken(token.clone())
        } else {
            Credentials::Anonymous
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_credentials_priority() {
        let config = Config {
            oauth_token: Some("oauth".to_string()),
            job_token: Some("job".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.configured_credentials(),
            Credentials::OAuthToken("oauth".to_string())
        );
        assert_eq!(Config::default().configured_credentials(), Credentials::Anonymous);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("glrest-config-test-{}", std::process::id()));
        let path = dir.join("config.json");

        let config = Config {
            url: Some("https://gitlab.example.com".to_string()),
            private_token: Some("glpat-123".to_string()),
            per_page: Some(50),
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);

        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_environment_overrides_file() {
        use crate::gitlab::auth::{JOB_TOKEN_ENV, OAUTH_TOKEN_ENV, PRIVATE_TOKEN_ENV};

        let vars = [URL_ENV, PRIVATE_TOKEN_ENV, OAUTH_TOKEN_ENV, JOB_TOKEN_ENV];
        let saved: Vec<Option<String>> = vars.iter().map(|v| std::env::var(v).ok()).collect();
        for var in vars {
            std::env::remove_var(var);
        }

        let config = Config {
            url: Some("https://file.example.com".to_string()),
            private_token: Some("from-file".to_string()),
            ..Config::default()
        };

        // File values apply when the environment is silent
        assert_eq!(config.effective_url(), "https://file.example.com");
        assert_eq!(
            config.effective_credentials(),
            Credentials::PrivateToken("from-file".to_string())
        );
        assert_eq!(Config::default().effective_url(), DEFAULT_URL);

        std::env::set_var(URL_ENV, "https://env.example.com");
        std::env::set_var(JOB_TOKEN_ENV, "from-env");
        assert_eq!(config.effective_url(), "https://env.example.com");
        assert_eq!(
            config.effective_credentials(),
            Credentials::JobToken("from-env".to_string())
        );

        // Empty variables are ignored
        std::env::set_var(URL_ENV, "");
        assert_eq!(config.effective_url(), "https://file.example.com");

        for (var, value) in vars.iter().zip(saved) {
            match value {
                Some(value) => std::env::set_var(var, value),
                None => std::env::remove_var(var),
            }
        }
    }

    #[test]
    fn test_missing_file_yields_default() {
        let path = std::env::temp_dir().join("glrest-definitely-missing").join("config.json");
        assert_eq!(Config::load_from(&path), Config::default());
    }
}
