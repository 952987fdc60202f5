//! # Configuration
//!
//! Runtime settings for the server. Values come from an optional YAML file
//! and are then overridden by environment variables, so a deployment can
//! ship a file with defaults and inject secrets through the environment.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the YAML config file
pub const CONFIG_PATH_ENV: &str = "COOP_LEDGER_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "coop-ledger.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the hosted backend, e.g. https://xyz.supabase.co
    pub supabase_url: String,
    /// Service key sent as `apikey` and bearer token
    pub supabase_service_key: String,
    pub bind_address: String,
    /// Storage bucket holding profile pictures
    pub avatar_bucket: String,
    pub request_timeout_secs: u64,
    /// Maximum entries per query cache
    pub cache_capacity: usize,
    /// Allowed CORS origin; any origin when unset
    pub cors_origin: Option<String>,
    /// Default log filter when RUST_LOG is not set
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            bind_address: "127.0.0.1:3000".to_string(),
            avatar_bucket: "avatars".to_string(),
            request_timeout_secs: 30,
            cache_capacity: 256,
            cors_origin: None,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load the configuration from the file named by `COOP_LEDGER_CONFIG`
    /// (or `coop-ledger.yaml` if present) plus environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .ok()
            .or_else(|| {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            });

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SUPABASE_URL") {
            self.supabase_url = url;
        }
        if let Some(key) = lookup("SUPABASE_SERVICE_KEY") {
            self.supabase_service_key = key;
        }
        if let Some(bind) = lookup("COOP_LEDGER_BIND") {
            self.bind_address = bind;
        }
        if let Some(bucket) = lookup("COOP_LEDGER_AVATAR_BUCKET") {
            self.avatar_bucket = bucket;
        }
        if let Some(origin) = lookup("COOP_LEDGER_CORS_ORIGIN") {
            self.cors_origin = Some(origin);
        }
        if let Some(value) = lookup("COOP_LEDGER_TIMEOUT_SECS") {
            self.request_timeout_secs = value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "COOP_LEDGER_TIMEOUT_SECS",
                value,
            })?;
        }
        if let Some(value) = lookup("COOP_LEDGER_CACHE_CAPACITY") {
            self.cache_capacity = value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "COOP_LEDGER_CACHE_CAPACITY",
                value,
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supabase_url.trim().is_empty() {
            return Err(ConfigError::Missing("supabase_url"));
        }
        if !self.supabase_url.starts_with("http://") && !self.supabase_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "supabase_url",
                value: self.supabase_url.clone(),
            });
        }
        if self.supabase_service_key.trim().is_empty() {
            return Err(ConfigError::Missing("supabase_service_key"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "request_timeout_secs",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_yaml_with_partial_fields_keeps_defaults() {
        let config = AppConfig::from_yaml_str(
            "supabase_url: https://example.supabase.co\nsupabase_service_key: secret\n",
        )
        .unwrap();

        assert_eq!(config.supabase_url, "https://example.supabase.co");
        assert_eq!(config.avatar_bucket, "avatars");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(AppConfig::from_yaml_str("  \n").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("SUPABASE_URL", "https://override.supabase.co"),
            ("SUPABASE_SERVICE_KEY", "env-key"),
            ("COOP_LEDGER_CACHE_CAPACITY", "32"),
            ("COOP_LEDGER_CORS_ORIGIN", "http://localhost:5173"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::from_yaml_str("supabase_url: https://file.supabase.co\n").unwrap();
        config
            .apply_env_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.supabase_url, "https://override.supabase.co");
        assert_eq!(config.supabase_service_key, "env-key");
        assert_eq!(config.cache_capacity, 32);
        assert_eq!(config.cors_origin.as_deref(), Some("http://localhost:5173"));
    }

    #[test]
    fn test_invalid_numeric_override() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(|name| {
            (name == "COOP_LEDGER_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_validate_requires_url_and_key() {
        let config = AppConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("supabase_url"))));

        let config = AppConfig {
            supabase_url: "ftp://example".to_string(),
            supabase_service_key: "key".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let config = AppConfig {
            supabase_url: "https://example.supabase.co".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("supabase_service_key"))
        ));
    }

    #[test]
    fn test_from_file_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::from_file(&dir.path().join("nope.yaml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
