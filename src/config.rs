//! Storefront engine configuration.
//!
//! Defaults, overridden by an optional TOML file, overridden by
//! `STOREFRONT_*` environment variables (`__` separates nested keys, e.g.
//! `STOREFRONT_RATE_LIMIT__FAIL_OPEN=false`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::gift::RevealConfig;
use crate::ratelimit::RateLimitPolicy;
use crate::retry::RetryOptions;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "STOREFRONT_CONFIG";
/// Configuration file used when `STOREFRONT_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "storefront.toml";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "STOREFRONT_";

// =============================================================================
// Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// =============================================================================
// Config structs
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub rate_limit: RateLimitPolicy,
    pub retry: RetryOptions,
    pub reveal: RevealConfig,
    pub cart_store: CartStoreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
        }
    }
}

/// Where carts are mirrored. Without a directory they live in memory only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartStoreConfig {
    pub dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.max_submissions == 0 {
            return Err(invalid("rate_limit.max_submissions", "must be at least 1"));
        }
        if self.rate_limit.window_minutes == 0 {
            return Err(invalid("rate_limit.window_minutes", "must be at least 1"));
        }
        if self.retry.backoff_factor.is_nan() || self.retry.backoff_factor < 1.0 {
            return Err(invalid("retry.backoff_factor", "must be 1.0 or more"));
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(invalid(
                "retry.initial_delay_ms",
                "must not exceed retry.max_delay_ms",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field,
        reason: reason.to_string(),
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Path of the configuration file: `$STOREFRONT_CONFIG` or `storefront.toml`.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Loads and validates the configuration from [`config_path`] and the
/// environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_path())
}

/// Loads and validates the configuration from `path` and the environment.
/// A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(CONFIG_ENV_PREFIX).split("__"));

    let config: AppConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}
