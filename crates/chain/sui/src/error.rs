//! Error types for the Sui adapter.

use gate_core::ChainError;
use thiserror::Error;

/// Errors that can occur while talking to a Sui full node.
#[derive(Debug, Error)]
pub enum SuiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Keystore error: {0}")]
    Keystore(String),

    #[error("Invalid transaction: {0}")]
    Lowering(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Insufficient sponsor balance: required {required}, available {available}")]
    InsufficientGas { required: u64, available: u64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SuiError>;

impl From<sui_sdk::error::Error> for SuiError {
    fn from(error: sui_sdk::error::Error) -> Self {
        SuiError::Network(error.to_string())
    }
}

impl From<SuiError> for ChainError {
    fn from(error: SuiError) -> Self {
        match error {
            SuiError::Network(message) => ChainError::Network(message),
            SuiError::Keystore(message) => ChainError::Signing(message),
            SuiError::Lowering(message) => ChainError::Backend(message),
            SuiError::InvalidResponse(message) => ChainError::InvalidResponse(message),
            SuiError::ObjectNotFound(id) => ChainError::ObjectNotFound(id),
            SuiError::InsufficientGas {
                required,
                available,
            } => ChainError::InsufficientGas {
                required,
                available,
            },
            SuiError::Other(error) => ChainError::Backend(format!("{error:#}")),
        }
    }
}
