//! Engine configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/booksmart/config.toml` by default:
//!
//! ```toml
//! [engine]
//! horizon_months = 2
//! max_occurrences_per_rule = 5000
//! fetch_timeout_secs = 10
//!
//! [store]
//! base_url = "http://localhost:8000"
//! timeout_secs = 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use booksmart_core::{Expander, Horizon};
use booksmart_store::HttpStoreConfig;

use crate::error::{EngineError, EngineResult};

/// Configuration for the booksmart engine and its store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Aggregation settings.
    pub engine: EngineSettings,
    /// Store connection settings.
    pub store: StoreSettings,
}

/// Aggregation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Calendar months past today to expand recurrences into.
    pub horizon_months: u32,
    /// Cap on occurrences produced by a single rule.
    pub max_occurrences_per_rule: usize,
    /// Per-source fetch timeout. No timeout when unset.
    pub fetch_timeout_secs: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            horizon_months: Horizon::DEFAULT_MONTHS,
            max_occurrences_per_rule: Expander::DEFAULT_MAX_OCCURRENCES,
            fetch_timeout_secs: None,
        }
    }
}

impl EngineSettings {
    /// Returns the per-source fetch timeout, if configured.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }
}

/// Store connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Base URL of the booking API.
    pub base_url: Option<String>,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// User agent override.
    pub user_agent: Option<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: HttpStoreConfig::DEFAULT_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from the default path, or defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> EngineResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or a configuration
    /// error if it is not valid.
    pub fn load_from(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            EngineError::config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("booksmart")
    }

    /// Checks values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending setting.
    pub fn validate(&self) -> EngineResult<()> {
        if self.engine.max_occurrences_per_rule == 0 {
            return Err(EngineError::config(
                "engine.max_occurrences_per_rule must be at least 1",
            ));
        }
        if self.engine.fetch_timeout_secs == Some(0) {
            return Err(EngineError::config(
                "engine.fetch_timeout_secs must be at least 1",
            ));
        }
        if self.store.timeout_secs == 0 {
            return Err(EngineError::config("store.timeout_secs must be at least 1"));
        }
        Ok(())
    }

    /// Builder: set the store base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.store.base_url = Some(base_url.into());
        self
    }

    /// Builder: set the horizon in months.
    pub fn with_horizon_months(mut self, months: u32) -> Self {
        self.engine.horizon_months = months;
        self
    }

    /// Builder: set the per-rule occurrence cap.
    pub fn with_max_occurrences(mut self, max: usize) -> Self {
        self.engine.max_occurrences_per_rule = max;
        self
    }

    /// Builder: set the per-source fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.engine.fetch_timeout_secs = Some(timeout.as_secs().max(1));
        self
    }

    /// Builds the HTTP store configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no base URL is set or it is invalid.
    pub fn http_store_config(&self) -> EngineResult<HttpStoreConfig> {
        let base_url = self
            .store
            .base_url
            .as_deref()
            .ok_or_else(|| EngineError::config("store.base_url is not set"))?;
        let mut config = HttpStoreConfig::new(base_url)
            .map_err(|e| EngineError::config(format!("invalid store.base_url {:?}: {}", base_url, e)))?
            .with_timeout(Duration::from_secs(self.store.timeout_secs));
        if let Some(ref user_agent) = self.store.user_agent {
            config = config.with_user_agent(user_agent);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.engine.horizon_months, 2);
        assert_eq!(config.engine.max_occurrences_per_rule, 5000);
        assert!(config.engine.fetch_timeout().is_none());
        assert!(config.store.base_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_path_ends_with_booksmart() {
        let path = EngineConfig::default_path();
        assert!(path.ends_with("booksmart/config.toml"));
    }

    #[test]
    fn parses_partial_file() {
        let config: EngineConfig = toml::from_str(
            r#"
            [engine]
            fetch_timeout_secs = 5

            [store]
            base_url = "http://localhost:8000"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.horizon_months, 2);
        assert_eq!(config.engine.fetch_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.store.timeout_secs, 30);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nhorizon_months = 6\n").unwrap();

        let config = EngineConfig::load_from(file.path()).unwrap();
        assert_eq!(config.engine.horizon_months, 6);
    }

    #[test]
    fn load_from_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine\nhorizon_months = ").unwrap();
        let err = EngineConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, EngineError::Config { .. }));
    }

    #[test]
    fn zero_cap_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nmax_occurrences_per_rule = 0").unwrap();
        let err = EngineConfig::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("max_occurrences_per_rule"));
    }

    #[test]
    fn http_store_config_requires_base_url() {
        let err = EngineConfig::default().http_store_config().unwrap_err();
        assert!(err.to_string().contains("base_url"));

        let config = EngineConfig::default()
            .with_base_url("http://localhost:8000/api")
            .http_store_config()
            .unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:8000/api/");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = EngineConfig::default()
            .with_base_url("http://store")
            .with_horizon_months(3)
            .with_fetch_timeout(Duration::from_secs(4));
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: EngineConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
