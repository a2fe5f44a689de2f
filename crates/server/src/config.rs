//! Server configuration loaded from the process environment.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use gate_core::{Address, ConfigError, MarketplaceConfig, SessionConfig, SharedObjectRef};

/// Listener and housekeeping settings.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Directory for the rolling log file; platform cache dir when unset.
    pub log_dir: Option<PathBuf>,
    /// How often expired sessions are swept out of the store.
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3001,
            log_dir: None,
            sweep_interval: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Construct configuration from process environment variables.
    ///
    /// - `HOST` / `PORT`
    /// - `LOG_DIR`
    /// - `SESSION_SWEEP_INTERVAL_SECONDS`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = optional::<IpAddr>("HOST")? {
            config.host = host;
        }
        if let Some(port) = optional::<u16>("PORT")? {
            config.port = port;
        }
        config.log_dir = env::var("LOG_DIR").ok().map(PathBuf::from);

        if let Some(secs) = optional::<u64>("SESSION_SWEEP_INTERVAL_SECONDS")? {
            config.sweep_interval = Duration::from_secs(secs.max(1));
        }

        Ok(config)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Marketplace objects and royalty from the environment.
///
/// - `NFT_PACKAGE_ID`, `NFT_TYPE`
/// - `KIOSK_ID`, `KIOSK_INITIAL_SHARED_VERSION`
/// - `TRANSFER_POLICY_ID`, `TRANSFER_POLICY_INITIAL_SHARED_VERSION`
/// - `ROYALTY_RULE_PACKAGE_ID` (default: `NFT_PACKAGE_ID`)
/// - `ROYALTY_BPS` (default: 1000)
/// - `ROYALTY_MIN_AMOUNT_MIST` (default: 0, must match the rule's `min_amount`)
pub fn marketplace_from_env() -> Result<MarketplaceConfig, ConfigError> {
    let package_id = required::<Address>("NFT_PACKAGE_ID")?;

    let config = MarketplaceConfig {
        package_id,
        nft_type: env::var("NFT_TYPE")
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| MarketplaceConfig::default_nft_type(&package_id)),
        kiosk: SharedObjectRef {
            id: required("KIOSK_ID")?,
            initial_shared_version: required("KIOSK_INITIAL_SHARED_VERSION")?,
        },
        transfer_policy: SharedObjectRef {
            id: required("TRANSFER_POLICY_ID")?,
            initial_shared_version: required("TRANSFER_POLICY_INITIAL_SHARED_VERSION")?,
        },
        royalty_rule_package_id: optional("ROYALTY_RULE_PACKAGE_ID")?.unwrap_or(package_id),
        royalty_bps: optional("ROYALTY_BPS")?.unwrap_or(MarketplaceConfig::DEFAULT_ROYALTY_BPS),
        royalty_min_mist: optional("ROYALTY_MIN_AMOUNT_MIST")?
            .unwrap_or(MarketplaceConfig::DEFAULT_ROYALTY_MIN_MIST),
    };

    config.validate()?;
    Ok(config)
}

/// Session lifetime and decryption parameters from the environment.
///
/// - `SESSION_DURATION_SECONDS` (default: 120)
/// - `SEAL_PACKAGE_ID` (default: the NFT package)
/// - `SEAL_THRESHOLD` (default: 2)
pub fn session_from_env(marketplace: &MarketplaceConfig) -> Result<SessionConfig, ConfigError> {
    let seal_package_id = optional("SEAL_PACKAGE_ID")?.unwrap_or(marketplace.package_id);
    let mut config = SessionConfig::new(seal_package_id);

    if let Some(secs) = optional::<u64>("SESSION_DURATION_SECONDS")? {
        config = config.with_duration(Duration::from_secs(secs));
    }
    if let Some(threshold) = optional::<u8>("SEAL_THRESHOLD")? {
        config = config.with_threshold(threshold);
    }

    config.validate()?;
    Ok(config)
}

fn optional<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }),
        _ => Ok(None),
    }
}

fn required<T>(key: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional(key)?.ok_or(ConfigError::Missing(key))
}
