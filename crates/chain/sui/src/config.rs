//! Sui network configuration.

use std::env;
use std::path::PathBuf;

use gate_core::{Address, ConfigError};

/// Sui network types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiNetwork {
    Mainnet,
    Testnet,
    Devnet,
    Local,
}

impl SuiNetwork {
    pub fn default_rpc_url(&self) -> &str {
        match self {
            SuiNetwork::Mainnet => "https://fullnode.mainnet.sui.io:443",
            SuiNetwork::Testnet => "https://fullnode.testnet.sui.io:443",
            SuiNetwork::Devnet => "https://fullnode.devnet.sui.io:443",
            SuiNetwork::Local => "http://127.0.0.1:9000",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SuiNetwork::Mainnet => "sui-mainnet",
            SuiNetwork::Testnet => "sui-testnet",
            SuiNetwork::Devnet => "sui-devnet",
            SuiNetwork::Local => "sui-local",
        }
    }

    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.to_lowercase().as_str() {
            "mainnet" => Ok(SuiNetwork::Mainnet),
            "testnet" => Ok(SuiNetwork::Testnet),
            "devnet" => Ok(SuiNetwork::Devnet),
            "local" | "localnet" => Ok(SuiNetwork::Local),
            other => Err(ConfigError::Invalid {
                key: "SUI_NETWORK",
                reason: format!("{other}: must be mainnet, testnet, devnet, or local"),
            }),
        }
    }
}

/// Sui-specific configuration.
#[derive(Debug, Clone)]
pub struct SuiConfig {
    /// Sui network to connect to
    pub network: SuiNetwork,

    /// Custom RPC endpoint URL (overrides network default)
    pub rpc_url: Option<String>,

    /// Gas budget for sponsored transactions (in MIST)
    pub gas_budget: u64,

    /// Keystore holding the sponsor key
    pub keystore_path: PathBuf,

    /// Sponsor address; the first keystore address when unset
    pub sponsor_address: Option<Address>,
}

impl SuiConfig {
    pub const DEFAULT_GAS_BUDGET: u64 = 100_000_000; // 0.1 SUI

    pub fn new(network: SuiNetwork) -> Self {
        Self {
            network,
            rpc_url: None,
            gas_budget: Self::DEFAULT_GAS_BUDGET,
            keystore_path: default_keystore_path(),
            sponsor_address: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// - `SUI_NETWORK` - mainnet, testnet, devnet, local (default: testnet)
    /// - `SUI_RPC_URL` - Custom RPC endpoint URL
    /// - `SUI_GAS_BUDGET` - Gas budget in MIST (default: 100000000)
    /// - `SUI_KEYSTORE_PATH` - Keystore file (default: ~/.sui/sui_config/sui.keystore)
    /// - `SUI_SPONSOR_ADDRESS` - Sponsor address in the keystore
    pub fn from_env() -> Result<Self, ConfigError> {
        let network = SuiNetwork::parse(
            &env::var("SUI_NETWORK").unwrap_or_else(|_| "testnet".to_string()),
        )?;

        let mut config = Self::new(network);
        config.rpc_url = env::var("SUI_RPC_URL").ok().filter(|url| !url.is_empty());

        if let Ok(raw) = env::var("SUI_GAS_BUDGET") {
            config.gas_budget = raw.parse().map_err(|_| ConfigError::Invalid {
                key: "SUI_GAS_BUDGET",
                reason: format!("{raw} is not a number"),
            })?;
        }

        if let Ok(path) = env::var("SUI_KEYSTORE_PATH") {
            config.keystore_path = PathBuf::from(path);
        }

        if let Ok(raw) = env::var("SUI_SPONSOR_ADDRESS") {
            config.sponsor_address = Some(Address::parse(&raw).map_err(|e| {
                ConfigError::Invalid {
                    key: "SUI_SPONSOR_ADDRESS",
                    reason: e.to_string(),
                }
            })?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    pub fn with_gas_budget(mut self, budget: u64) -> Self {
        self.gas_budget = budget;
        self
    }

    pub fn with_keystore_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.keystore_path = path.into();
        self
    }

    /// The RPC URL (custom or default for network).
    pub fn get_rpc_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_rpc_url())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.get_rpc_url();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                key: "SUI_RPC_URL",
                reason: format!("invalid RPC URL format: {url}"),
            });
        }

        if self.gas_budget == 0 {
            return Err(ConfigError::Invalid {
                key: "SUI_GAS_BUDGET",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for SuiConfig {
    fn default() -> Self {
        Self::new(SuiNetwork::Testnet)
    }
}

/// `~/.sui/sui_config/sui.keystore`, or a relative path if there is no home.
pub fn default_keystore_path() -> PathBuf {
    let relative = PathBuf::from(".sui").join("sui_config").join("sui.keystore");
    match directories::BaseDirs::new() {
        Some(base) => base.home_dir().join(relative),
        None => relative,
    }
}
