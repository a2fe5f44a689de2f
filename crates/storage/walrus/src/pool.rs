//! Endpoint pool configuration.
//!
//! Pool membership and order are data, not code: a TOML file lists
//! publishers (upload) and aggregators (download), and an optional primary
//! endpoint is prepended to each list.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::PoolConfigError;

const BUNDLED_TESTNET: &str = include_str!("../config/walrus-testnet.toml");

/// Pool configuration as loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    #[serde(default)]
    pub publishers: Vec<String>,

    #[serde(default)]
    pub aggregators: Vec<String>,

    /// Tried before every publisher in the list.
    #[serde(default)]
    pub primary_publisher: Option<String>,

    /// Tried before every aggregator in the list.
    #[serde(default)]
    pub primary_aggregator: Option<String>,

    /// Per-endpoint attempt timeout.
    #[serde(default = "PoolConfig::default_timeout_ms")]
    pub timeout_ms: u64,

    /// Storage epochs requested on upload.
    #[serde(default = "PoolConfig::default_epochs")]
    pub epochs: u32,
}

impl PoolConfig {
    pub const DEFAULT_TIMEOUT_MS: u64 = 8_000;
    pub const DEFAULT_EPOCHS: u32 = 5;

    fn default_timeout_ms() -> u64 {
        Self::DEFAULT_TIMEOUT_MS
    }

    fn default_epochs() -> u32 {
        Self::DEFAULT_EPOCHS
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, PoolConfigError> {
        toml::from_str(raw).map_err(|e| PoolConfigError::Parse(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PoolConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| PoolConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// The testnet pool shipped with the crate.
    pub fn bundled_testnet() -> Result<Self, PoolConfigError> {
        Self::from_toml_str(BUNDLED_TESTNET)
    }

    /// Load the pool and apply environment overrides.
    ///
    /// - `WALRUS_POOL_FILE`: TOML file (default: bundled testnet pool)
    /// - `WALRUS_PRIMARY_PUBLISHER` / `WALRUS_PRIMARY_AGGREGATOR`
    /// - `WALRUS_ENDPOINT_TIMEOUT_MS`, `WALRUS_EPOCHS`
    pub fn from_env() -> Result<Self, PoolConfigError> {
        let mut config = match std::env::var("WALRUS_POOL_FILE") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(PathBuf::from(path))?,
            _ => Self::bundled_testnet()?,
        };

        if let Some(primary) = non_empty_env("WALRUS_PRIMARY_PUBLISHER") {
            config.primary_publisher = Some(primary);
        }
        if let Some(primary) = non_empty_env("WALRUS_PRIMARY_AGGREGATOR") {
            config.primary_aggregator = Some(primary);
        }
        if let Some(raw) = non_empty_env("WALRUS_ENDPOINT_TIMEOUT_MS") {
            config.timeout_ms = raw.parse().map_err(|_| PoolConfigError::InvalidValue {
                key: "WALRUS_ENDPOINT_TIMEOUT_MS",
                value: raw,
            })?;
        }
        if let Some(raw) = non_empty_env("WALRUS_EPOCHS") {
            config.epochs = raw.parse().map_err(|_| PoolConfigError::InvalidValue {
                key: "WALRUS_EPOCHS",
                value: raw,
            })?;
        }

        Ok(config)
    }

    pub fn with_primary_publisher(mut self, url: impl Into<String>) -> Self {
        self.primary_publisher = Some(url.into());
        self
    }

    pub fn with_primary_aggregator(mut self, url: impl Into<String>) -> Self {
        self.primary_aggregator = Some(url.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Ordered, de-duplicated endpoint lists ready for iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPool {
    publishers: Vec<String>,
    aggregators: Vec<String>,
}

impl EndpointPool {
    pub fn new(publishers: Vec<String>, aggregators: Vec<String>) -> Self {
        Self {
            publishers: normalize(None, publishers),
            aggregators: normalize(None, aggregators),
        }
    }

    /// Build from configuration; each primary goes first. Both sides must
    /// have at least one endpoint.
    pub fn from_config(config: &PoolConfig) -> Result<Self, PoolConfigError> {
        let pool = Self {
            publishers: normalize(config.primary_publisher.clone(), config.publishers.clone()),
            aggregators: normalize(config.primary_aggregator.clone(), config.aggregators.clone()),
        };

        if pool.publishers.is_empty() {
            return Err(PoolConfigError::Empty("publisher"));
        }
        if pool.aggregators.is_empty() {
            return Err(PoolConfigError::Empty("aggregator"));
        }
        if config.timeout_ms == 0 {
            return Err(PoolConfigError::InvalidValue {
                key: "timeout_ms",
                value: "0".to_string(),
            });
        }

        Ok(pool)
    }

    pub fn publishers(&self) -> &[String] {
        &self.publishers
    }

    pub fn aggregators(&self) -> &[String] {
        &self.aggregators
    }
}

fn normalize(primary: Option<String>, rest: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(rest.len() + 1);
    for url in primary.into_iter().chain(rest) {
        let url = url.trim().trim_end_matches('/').to_string();
        if !url.is_empty() && !out.contains(&url) {
            out.push(url);
        }
    }
    out
}
