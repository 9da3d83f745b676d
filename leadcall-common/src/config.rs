//! Configuration loading
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`LEADCALL_*`, wired through clap in the binary)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 arrive here as a [`ConfigOverrides`]; this module owns
//! tiers 3 and 4 and the final validation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "LEADCALL_CONFIG";

/// Default provider API base URL
pub const DEFAULT_PROVIDER_URL: &str = "https://api.vapi.ai";

/// Default lead store API base URL
pub const DEFAULT_LEAD_STORE_URL: &str = "http://127.0.0.1:5000/api";

/// Default HTTP bind address for the status/event surface
pub const DEFAULT_BIND: &str = "127.0.0.1:5740";

/// Root TOML configuration
///
/// Every section and field is optional in the file; omitted values take the
/// compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub provider: ProviderConfig,
    pub lead_store: LeadStoreConfig,
    pub reconciler: ReconcilerSettings,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Voice-call provider connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Private API key (bearer token); required while the reconciler is enabled
    pub api_key: Option<String>,
    /// Client-side HTTP timeout
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROVIDER_URL.to_string(),
            api_key: None,
            timeout_ms: 10_000,
        }
    }
}

/// Lead store REST API connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadStoreConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout_ms: u64,
}

impl Default for LeadStoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LEAD_STORE_URL.to_string(),
            api_token: None,
            timeout_ms: 10_000,
        }
    }
}

/// What happens to a call whose lead update failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryPolicy {
    /// Key stays marked as processed; the update is lost
    #[default]
    AtMostOnce,
    /// Key is released so the next tick tries the update again
    RetryFailedUpdates,
}

/// Poller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerSettings {
    pub enabled: bool,
    /// Pause between the end of one tick and the start of the next
    pub tick_interval_ms: u64,
    /// Number of most recent calls requested per tick
    pub recent_call_limit: usize,
    /// Upper bound for each collaborator call made inside a tick
    pub request_timeout_ms: u64,
    pub delivery: DeliveryPolicy,
    /// Cap on remembered call observations; unset keeps every key for the
    /// process lifetime
    pub max_seen_keys: Option<usize>,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_ms: 30_000,
            recent_call_limit: 5,
            request_timeout_ms: 10_000,
            delivery: DeliveryPolicy::AtMostOnce,
            max_seen_keys: None,
        }
    }
}

impl ReconcilerSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// HTTP status/event surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing level when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub provider_url: Option<String>,
    pub provider_api_key: Option<String>,
    pub lead_store_url: Option<String>,
    pub lead_store_token: Option<String>,
    pub tick_interval_ms: Option<u64>,
    pub recent_call_limit: Option<usize>,
    pub delivery: Option<DeliveryPolicy>,
    pub bind: Option<String>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// Apply CLI/ENV values on top of file values
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.provider_url {
            self.provider.base_url = url;
        }
        if let Some(key) = overrides.provider_api_key {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = overrides.lead_store_url {
            self.lead_store.base_url = url;
        }
        if let Some(token) = overrides.lead_store_token {
            self.lead_store.api_token = Some(token);
        }
        if let Some(ms) = overrides.tick_interval_ms {
            self.reconciler.tick_interval_ms = ms;
        }
        if let Some(limit) = overrides.recent_call_limit {
            self.reconciler.recent_call_limit = limit;
        }
        if let Some(delivery) = overrides.delivery {
            self.reconciler.delivery = delivery;
        }
        if let Some(bind) = overrides.bind {
            self.server.bind = bind;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Check the resolved configuration before anything is started
    pub fn validate(&self) -> Result<()> {
        if self.reconciler.enabled
            && !self
                .provider
                .api_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty())
        {
            return Err(Error::Config(format!(
                "Provider API key not configured. Set one of:\n\
                 1. Command line: --provider-api-key <key>\n\
                 2. Environment: LEADCALL_PROVIDER_API_KEY=<key>\n\
                 3. TOML config ({}): [provider] api_key = \"<key>\"",
                default_config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "config.toml".to_string())
            )));
        }
        if self.provider.base_url.trim().is_empty() {
            return Err(Error::Config("provider.base_url must not be empty".to_string()));
        }
        if self.lead_store.base_url.trim().is_empty() {
            return Err(Error::Config("lead_store.base_url must not be empty".to_string()));
        }
        if self.reconciler.tick_interval_ms == 0 {
            return Err(Error::Config("reconciler.tick_interval_ms must be > 0".to_string()));
        }
        if self.reconciler.recent_call_limit == 0 {
            return Err(Error::Config("reconciler.recent_call_limit must be > 0".to_string()));
        }
        if self.reconciler.request_timeout_ms == 0 {
            return Err(Error::Config("reconciler.request_timeout_ms must be > 0".to_string()));
        }
        if self.reconciler.max_seen_keys == Some(0) {
            return Err(Error::Config("reconciler.max_seen_keys must be > 0 when set".to_string()));
        }
        Ok(())
    }

    /// Render as TOML with secrets masked, for `--print-config`
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut redacted = self.clone();
        if redacted.provider.api_key.is_some() {
            redacted.provider.api_key = Some("********".to_string());
        }
        if redacted.lead_store.api_token.is_some() {
            redacted.lead_store.api_token = Some("********".to_string());
        }
        toml::to_string_pretty(&redacted)
            .map_err(|e| Error::Internal(format!("TOML serialization failed: {}", e)))
    }
}

/// Per-user config file path (`~/.config/leadcall/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("leadcall").join("config.toml"))
}

/// Find the config file to load
///
/// Order: explicit path, `LEADCALL_CONFIG`, per-user file, then
/// `/etc/leadcall/config.toml` on Linux. Only the explicit and ENV paths are
/// returned without checking existence, so a typo there is reported instead
/// of silently falling back.
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    if let Some(user_config) = default_config_path() {
        if user_config.exists() {
            return Some(user_config);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/leadcall/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Parse one TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|source| Error::ConfigParse {
        path: path.display().to_string(),
        source,
    })
}

/// Load file configuration with graceful degradation
///
/// No config file anywhere is not an error: a warning is logged and compiled
/// defaults are used. A file that was explicitly requested but cannot be read,
/// or any file that fails to parse, is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    match locate_config_file(explicit) {
        Some(path) => {
            let config = load_toml_config(&path).map_err(|e| match e {
                Error::Io(io) => Error::Config(format!(
                    "Cannot read config file {}: {}",
                    path.display(),
                    io
                )),
                other => other,
            })?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => {
            warn!("No config file found, using compiled defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Write a config file, creating parent directories
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Internal(format!("TOML serialization failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> TomlConfig {
        let mut config = TomlConfig::default();
        config.provider.api_key = Some("sk-test".to_string());
        config
    }

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.reconciler.tick_interval(), Duration::from_secs(30));
        assert_eq!(config.reconciler.recent_call_limit, 5);
        assert_eq!(config.reconciler.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.reconciler.delivery, DeliveryPolicy::AtMostOnce);
        assert_eq!(config.reconciler.max_seen_keys, None);
        assert_eq!(config.server.bind, DEFAULT_BIND);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_requires_api_key() {
        let config = TomlConfig::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut blank = TomlConfig::default();
        blank.provider.api_key = Some("   ".to_string());
        assert!(blank.validate().is_err());

        assert!(valid_config().validate().is_ok());

        let mut phone_only = TomlConfig::default();
        phone_only.reconciler.enabled = false;
        assert!(phone_only.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = valid_config();
        config.reconciler.tick_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.reconciler.recent_call_limit = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.reconciler.max_seen_keys = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_take_priority() {
        let mut config = valid_config();
        config.apply_overrides(ConfigOverrides {
            provider_url: Some("http://mock".to_string()),
            tick_interval_ms: Some(1_000),
            delivery: Some(DeliveryPolicy::RetryFailedUpdates),
            ..Default::default()
        });
        assert_eq!(config.provider.base_url, "http://mock");
        assert_eq!(config.reconciler.tick_interval_ms, 1_000);
        assert_eq!(config.reconciler.delivery, DeliveryPolicy::RetryFailedUpdates);
        // Untouched values keep file/default values
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.reconciler.recent_call_limit, 5);
    }

    #[test]
    fn test_redacted_toml_masks_secrets() {
        let mut config = valid_config();
        config.lead_store.api_token = Some("secret-token".to_string());
        let rendered = config.to_redacted_toml().unwrap();
        assert!(!rendered.contains("sk-test"));
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("********"));
    }

    #[test]
    fn test_delivery_policy_kebab_case() {
        let parsed: ReconcilerSettings =
            toml::from_str("delivery = \"retry-failed-updates\"").unwrap();
        assert_eq!(parsed.delivery, DeliveryPolicy::RetryFailedUpdates);
        assert_eq!(parsed.tick_interval_ms, 30_000);
    }
}
