//! # Validator Configuration
//!
//! Store-level switches for kit stock validation.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     KITGUARD_MODE=remote                                                │
//! │     KITGUARD_REMOTE_URL=http://10.0.0.5:8080                            │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/kitguard/kitguard.toml (Linux)                            │
//! │     ~/Library/Application Support/com.kitguard.pos/kitguard.toml (mac)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! │     enabled, local mode, diagnostics fail closed                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [store]
//! context_id = "store-001"
//! name = "Downtown Branch"
//!
//! [validation]
//! enabled = true
//! mode = "local"                      # local | remote
//! diagnostic_policy = "fail_closed"   # fail_open | fail_closed
//! concurrent_order_checks = false
//!
//! [remote]
//! url = "http://10.0.0.5:8080"
//! timeout_secs = 5
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use kitguard_core::validation::validate_context_id;
use kitguard_core::{MetadataPolicy, ValidationMode, ValidationPolicy};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Store
// =============================================================================

/// The store/register this session validates for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Forwarded to the remote endpoint as `contextId`.
    #[serde(default = "default_context_id")]
    pub context_id: String,

    #[serde(default)]
    pub name: String,
}

fn default_context_id() -> String {
    "default-store".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            context_id: default_context_id(),
            name: "Default Store".to_string(),
        }
    }
}

// =============================================================================
// Validation Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// "Enable kit stock validation"; off means every line is valid.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub mode: ValidationMode,

    /// Unknown kit flags during diagnostics only.
    #[serde(default)]
    pub diagnostic_policy: MetadataPolicy,

    #[serde(default)]
    pub concurrent_order_checks: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ValidationSettings {
    fn default() -> Self {
        ValidationSettings {
            enabled: true,
            mode: ValidationMode::default(),
            diagnostic_policy: MetadataPolicy::default(),
            concurrent_order_checks: false,
        }
    }
}

// =============================================================================
// Remote Endpoint
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Base URL of the stock-api (required in remote mode).
    #[serde(default)]
    pub url: Option<String>,

    /// Request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    5
}

impl Default for RemoteSettings {
    fn default() -> Self {
        RemoteSettings {
            url: None,
            timeout_secs: default_timeout(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete validator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub validation: ValidationSettings,

    #[serde(default)]
    pub remote: RemoteSettings,
}

impl ValidatorConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (kitguard.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading validator config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load validator config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Validator config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_context_id(&self.store.context_id)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if let Some(ref raw) = self.remote.url {
            let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(format!("{raw}: {e}")))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::InvalidUrl(format!(
                    "Remote URL must start with http:// or https://, got: {}",
                    raw
                )));
            }
        }

        if self.validation.mode == ValidationMode::Remote && self.remote.url.is_none() {
            return Err(ConfigError::Invalid(
                "remote mode requires remote.url".into(),
            ));
        }

        if self.remote.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `KITGUARD_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(enabled) = lookup("KITGUARD_ENABLED") {
            match parse_bool(&enabled) {
                Some(value) => self.validation.enabled = value,
                None => warn!(value = %enabled, "Ignoring KITGUARD_ENABLED"),
            }
        }

        if let Some(mode) = lookup("KITGUARD_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding validation mode from environment");
                    self.validation.mode = parsed;
                }
                Err(e) => warn!(error = %e, "Ignoring KITGUARD_MODE"),
            }
        }

        if let Some(url) = lookup("KITGUARD_REMOTE_URL") {
            debug!(url = %url, "Overriding remote URL from environment");
            self.remote.url = Some(url);
        }

        if let Some(id) = lookup("KITGUARD_CONTEXT_ID") {
            self.store.context_id = id;
        }

        if let Some(policy) = lookup("KITGUARD_DIAGNOSTIC_POLICY") {
            match policy.parse() {
                Ok(parsed) => self.validation.diagnostic_policy = parsed,
                Err(e) => warn!(error = %e, "Ignoring KITGUARD_DIAGNOSTIC_POLICY"),
            }
        }

        if let Some(concurrent) = lookup("KITGUARD_CONCURRENT_ORDER_CHECKS") {
            match parse_bool(&concurrent) {
                Some(value) => self.validation.concurrent_order_checks = value,
                None => warn!(value = %concurrent, "Ignoring KITGUARD_CONCURRENT_ORDER_CHECKS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "kitguard", "pos")
            .map(|dirs| dirs.config_dir().join("kitguard.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The policy handed to the line validator.
    pub fn policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            enabled: self.validation.enabled,
            mode: self.validation.mode,
            diagnostic_metadata_policy: self.validation.diagnostic_policy,
            concurrent_order_checks: self.validation.concurrent_order_checks,
        }
    }

    pub fn context_id(&self) -> &str {
        &self.store.context_id
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote.url.as_deref()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ValidatorConfig::default();
        assert!(config.validate().is_ok());

        let policy = config.policy();
        assert!(policy.enabled);
        assert_eq!(policy.mode, ValidationMode::Local);
        assert_eq!(policy.diagnostic_metadata_policy, MetadataPolicy::FailClosed);
        assert!(!policy.concurrent_order_checks);
    }

    #[test]
    fn test_toml_file() {
        let config: ValidatorConfig = toml::from_str(
            r#"
            [store]
            context_id = "store-7"

            [validation]
            mode = "remote"
            diagnostic_policy = "fail_open"

            [remote]
            url = "http://10.0.0.5:8080"
            "#,
        )
        .unwrap();

        assert_eq!(config.context_id(), "store-7");
        assert_eq!(config.validation.mode, ValidationMode::Remote);
        assert_eq!(config.validation.diagnostic_policy, MetadataPolicy::FailOpen);
        assert!(config.validation.enabled);
        assert_eq!(config.remote.timeout_secs, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ValidatorConfig::default();
        config.apply_overrides(env(&[
            ("KITGUARD_ENABLED", "false"),
            ("KITGUARD_MODE", "remote"),
            ("KITGUARD_REMOTE_URL", "https://stock.example.com"),
            ("KITGUARD_CONTEXT_ID", "register-2"),
            ("KITGUARD_DIAGNOSTIC_POLICY", "fail-open"),
            ("KITGUARD_CONCURRENT_ORDER_CHECKS", "1"),
        ]));

        assert!(!config.validation.enabled);
        assert_eq!(config.validation.mode, ValidationMode::Remote);
        assert_eq!(config.remote_url(), Some("https://stock.example.com"));
        assert_eq!(config.context_id(), "register-2");
        assert_eq!(config.validation.diagnostic_policy, MetadataPolicy::FailOpen);
        assert!(config.validation.concurrent_order_checks);
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = ValidatorConfig::default();
        config.apply_overrides(env(&[("KITGUARD_MODE", "sideways"), ("KITGUARD_ENABLED", "maybe")]));

        assert_eq!(config, ValidatorConfig::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ValidatorConfig::default();

        config.validation.mode = ValidationMode::Remote;
        assert!(config.validate().is_err());

        config.remote.url = Some("ws://invalid".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));

        config.remote.url = Some("http://localhost:8080".to_string());
        assert!(config.validate().is_ok());

        config.store.context_id = "x".repeat(101);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip_sections() {
        let toml_str = toml::to_string_pretty(&ValidatorConfig::default()).unwrap();
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[validation]"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("kitguard-missing-config-test.toml");
        let config = ValidatorConfig::load_or_default(Some(path));
        assert!(config.validate().is_ok());
    }
}
