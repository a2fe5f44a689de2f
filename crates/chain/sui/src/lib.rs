//! Sui adapter for gate-core.
//!
//! ```text
//! SuiChainClient          → ChainReader          (owned objects, kiosk listings)
//! SuiTransactionExecutor  → TransactionExecutor  (lower, sign, execute)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use gate_chain_sui::{SuiChainClient, SuiConfig, SuiTransactionExecutor};
//!
//! let config = SuiConfig::from_env()?;
//! let reader = SuiChainClient::connect(&config).await?;
//! let executor = SuiTransactionExecutor::from_config(reader.sui_client().clone(), &config)?;
//! ```

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod executor;
pub mod lowering;

pub use client::{KIOSK_LISTING_TYPE, SuiChainClient};
pub use config::{SuiConfig, SuiNetwork, default_keystore_path};
pub use error::{Result, SuiError};
pub use executor::{SuiTransactionExecutor, load_keystore};
pub use lowering::lower_purchase;
