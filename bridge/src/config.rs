//! Bridge configuration: the closed option set from spec section 6, sourced
//! from environment variables with an optional TOML file override.

use std::path::{Path, PathBuf};

use rule_engine::HealthThresholds;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Health thresholds in their TOML-overridable shape, mirroring
/// `rule_engine::HealthThresholds` field for field.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthThresholdsConfig {
    pub max_error_rate: f64,
    pub max_latency_us: u64,
    pub max_timeouts: u64,
}

impl Default for HealthThresholdsConfig {
    fn default() -> Self {
        let d = HealthThresholds::default();
        Self {
            max_error_rate: d.max_error_rate,
            max_latency_us: d.max_latency_us,
            max_timeouts: d.max_timeouts,
        }
    }
}

impl From<HealthThresholdsConfig> for HealthThresholds {
    fn from(c: HealthThresholdsConfig) -> Self {
        HealthThresholds {
            max_error_rate: c.max_error_rate,
            max_latency_us: c.max_latency_us,
            max_timeouts: c.max_timeouts,
        }
    }
}

/// The bridge's closed configuration set (spec section 6).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hitlog_dir: PathBuf,
    pub data_plane_url: String,
    pub listen_addr: String,
    pub max_rules_per_bundle: usize,
    pub max_priority: u32,
    pub require_signatures: bool,
    pub health_thresholds: HealthThresholdsConfig,
    pub auto_rollback: bool,
    pub cache_ttl_seconds: u64,
    pub max_cache_size: usize,
    pub sampling_rate_default: f64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hitlog_dir: PathBuf::from("./var/hitlog"),
            data_plane_url: "http://127.0.0.1:7070".to_string(),
            listen_addr: "0.0.0.0:7070".to_string(),
            max_rules_per_bundle: 1000,
            max_priority: 10_000,
            require_signatures: false,
            health_thresholds: HealthThresholdsConfig::default(),
            auto_rollback: true,
            cache_ttl_seconds: 60,
            max_cache_size: 100_000,
            sampling_rate_default: 1.0,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration starting from defaults, then environment
    /// variables, then (if given) a TOML file whose values take final
    /// precedence.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env();

        if let Some(path) = config_path {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let file_config: TomlConfig =
                toml::from_str(&text).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            file_config.merge_into(&mut config);
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("HITLOG_DIR") {
            self.hitlog_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DATA_PLANE_URL") {
            self.data_plane_url = v;
        }
        if let Ok(v) = std::env::var("LISTEN_ADDR") {
            self.listen_addr = v;
        }
        if let Ok(v) = std::env::var("MAX_RULES_PER_BUNDLE") {
            if let Ok(n) = v.parse() {
                self.max_rules_per_bundle = n;
            }
        }
        if let Ok(v) = std::env::var("MAX_PRIORITY") {
            if let Ok(n) = v.parse() {
                self.max_priority = n;
            }
        }
        if let Ok(v) = std::env::var("REQUIRE_SIGNATURES") {
            self.require_signatures = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = std::env::var("AUTO_ROLLBACK") {
            self.auto_rollback = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = std::env::var("CACHE_TTL_SECONDS") {
            if let Ok(n) = v.parse() {
                self.cache_ttl_seconds = n;
            }
        }
        if let Ok(v) = std::env::var("MAX_CACHE_SIZE") {
            if let Ok(n) = v.parse() {
                self.max_cache_size = n;
            }
        }
        if let Ok(v) = std::env::var("SAMPLING_RATE_DEFAULT") {
            if let Ok(n) = v.parse() {
                self.sampling_rate_default = n;
            }
        }
        if let Ok(v) = std::env::var("RUST_LOG") {
            self.log_level = v;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rules_per_bundle == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_rules_per_bundle",
                reason: "must be greater than 0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.sampling_rate_default) {
            return Err(ConfigError::InvalidValue {
                field: "sampling_rate_default",
                reason: "must be between 0.0 and 1.0".to_string(),
            });
        }
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidValue {
                field: "listen_addr",
                reason: format!("'{}' is not a valid socket address", self.listen_addr),
            });
        }
        Ok(())
    }
}

/// TOML-file shape: every field optional so a file may override only a
/// subset of the option set.
#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    hitlog_dir: Option<PathBuf>,
    data_plane_url: Option<String>,
    listen_addr: Option<String>,
    max_rules_per_bundle: Option<usize>,
    max_priority: Option<u32>,
    require_signatures: Option<bool>,
    health_thresholds: Option<HealthThresholdsConfig>,
    auto_rollback: Option<bool>,
    cache_ttl_seconds: Option<u64>,
    max_cache_size: Option<usize>,
    sampling_rate_default: Option<f64>,
    log_level: Option<String>,
}

impl TomlConfig {
    fn merge_into(self, config: &mut Config) {
        if let Some(v) = self.hitlog_dir {
            config.hitlog_dir = v;
        }
        if let Some(v) = self.data_plane_url {
            config.data_plane_url = v;
        }
        if let Some(v) = self.listen_addr {
            config.listen_addr = v;
        }
        if let Some(v) = self.max_rules_per_bundle {
            config.max_rules_per_bundle = v;
        }
        if let Some(v) = self.max_priority {
            config.max_priority = v;
        }
        if let Some(v) = self.require_signatures {
            config.require_signatures = v;
        }
        if let Some(v) = self.health_thresholds {
            config.health_thresholds = v;
        }
        if let Some(v) = self.auto_rollback {
            config.auto_rollback = v;
        }
        if let Some(v) = self.cache_ttl_seconds {
            config.cache_ttl_seconds = v;
        }
        if let Some(v) = self.max_cache_size {
            config.max_cache_size = v;
        }
        if let Some(v) = self.sampling_rate_default {
            config.sampling_rate_default = v;
        }
        if let Some(v) = self.log_level {
            config.log_level = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_listen_addr() {
        let mut config = Config::default();
        config.listen_addr = "not-an-addr".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_max_rules() {
        let mut config = Config::default();
        config.max_rules_per_bundle = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_override_replaces_only_given_fields() {
        let mut config = Config::default();
        let original_listen = config.listen_addr.clone();
        let toml_config: TomlConfig = toml::from_str("max_priority = 500\n").unwrap();
        toml_config.merge_into(&mut config);
        assert_eq!(config.max_priority, 500);
        assert_eq!(config.listen_addr, original_listen);
    }
}
