//! Client configuration
//!
//! ## Resolution
//!
//! Settings are layered, later layers win:
//! 1. Built-in defaults (`http://localhost:5000`, 30 second timeout)
//! 2. Config file: explicit path, else `~/.config/solvency/config.toml`
//! 3. Environment: `SOLVENCY_API_URL`, `SOLVENCY_TIMEOUT_SECS`
//!
//! ```toml
//! api_url = "https://risk.example.com"
//! timeout_secs = 15
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolved client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the prediction API (no trailing slash)
    pub api_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// On-disk shape; every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    api_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Resolve defaults, config file and environment
    ///
    /// A missing file is fine; an unreadable or malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let path = path.map(Path::to_path_buf).or_else(default_config_path);
        if let Some(path) = path.filter(|p| p.exists()) {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            config.merge_toml(&content)?;
            tracing::debug!(path = %path.display(), "Loaded client config");
        }

        config.apply_overrides(
            std::env::var("SOLVENCY_API_URL").ok(),
            std::env::var("SOLVENCY_TIMEOUT_SECS").ok(),
        )?;
        Ok(config)
    }

    /// Layer a TOML document over the current values
    pub fn merge_toml(&mut self, content: &str) -> Result<()> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        if let Some(url) = file.api_url {
            self.api_url = normalize_url(&url);
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = timeout_from_secs(secs)?;
        }
        Ok(())
    }

    /// Layer raw string overrides (environment or CLI) over the current values
    pub fn apply_overrides(
        &mut self,
        api_url: Option<String>,
        timeout_secs: Option<String>,
    ) -> Result<()> {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = normalize_url(&url);
        }
        if let Some(raw) = timeout_secs {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid timeout seconds: {}", raw)))?;
            self.timeout = timeout_from_secs(secs)?;
        }
        Ok(())
    }
}

/// A zero timeout would fail every request
fn timeout_from_secs(secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(Error::Config(
            "Timeout must be at least 1 second".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("solvency").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, "http://localhost:5000");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_merge_toml_partial() {
        let mut config = ClientConfig::default();
        config
            .merge_toml(r#"api_url = "https://risk.example.com/""#)
            .unwrap();
        assert_eq!(config.api_url, "https://risk.example.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_merge_toml_rejects_unknown_keys() {
        let mut config = ClientConfig::default();
        assert!(config.merge_toml("api_uri = \"x\"").is_err());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut config = ClientConfig::default();
        config.merge_toml("timeout_secs = 5").unwrap();
        config
            .apply_overrides(Some("http://10.0.0.2:5000".into()), Some("12".into()))
            .unwrap();
        assert_eq!(config.api_url, "http://10.0.0.2:5000");
        assert_eq!(config.timeout, Duration::from_secs(12));
    }

    #[test]
    fn test_bad_timeout_override() {
        let mut config = ClientConfig::default();
        let err = config.apply_overrides(None, Some("soon".into())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ClientConfig::default();
        let err = config.merge_toml("timeout_secs = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = config.apply_overrides(None, Some(" 0 ".into())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_url = \"http://example.test\"\ntimeout_secs = 7\n").unwrap();

        let config = ClientConfig::load(Some(&path)).unwrap();
        // Environment overrides take precedence when set
        if std::env::var("SOLVENCY_API_URL").is_err() {
            assert_eq!(config.api_url, "http://example.test");
        }
        if std::env::var("SOLVENCY_TIMEOUT_SECS").is_err() {
            assert_eq!(config.timeout, Duration::from_secs(7));
        }
    }
}
