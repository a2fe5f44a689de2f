//! Error taxonomy for access gating, purchasing, and blob storage.
//!
//! Each concern has its own enum so callers can map failures to a specific
//! recovery path (re-authenticate, renew, refresh listings, retry later).

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{Address, BlobId, ObjectId, SessionId};

// ============================================================================
// Identifiers
// ============================================================================

/// Errors raised while parsing a Sui-style address or object id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),

    #[error("address is longer than 64 hex digits: {0}")]
    TooLong(String),

    #[error("address contains non-hex characters: {0}")]
    InvalidHex(String),
}

// ============================================================================
// Chain collaborators
// ============================================================================

/// Errors surfaced by chain query and submission clients.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("network error: {0}")]
    Network(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("insufficient gas: required {required}, available {available}")]
    InsufficientGas { required: u64, available: u64 },

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("backend-specific error: {0}")]
    Backend(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Sessions
// ============================================================================

/// Errors raised by session store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store lock was poisoned")]
    LockPoisoned,

    #[error("session store backend error: {0}")]
    Backend(String),
}

/// Errors from the watch path: ownership gating and session redemption.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Ownership check failed (or could not be performed).
    #[error("address {user} does not own {nft_id}")]
    NotOwned { user: Address, nft_id: ObjectId },

    /// No session with this id; the caller must re-authenticate.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The session existed but ran out; the caller can renew.
    #[error("session {session_id} expired at {expired_at}")]
    SessionExpired {
        session_id: SessionId,
        expired_at: DateTime<Utc>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// Purchases
// ============================================================================

/// Errors from the sponsored purchase flow.
#[derive(Debug, Error)]
pub enum PurchaseError {
    /// Request shape is wrong; nothing was sent to the chain.
    #[error("invalid purchase request: {0}")]
    InvalidRequest(String),

    /// The item is not (or no longer) listed in the marketplace.
    #[error("listing not found for {0}")]
    ListingNotFound(ObjectId),

    /// Another buyer won the race between listing read and submission.
    #[error("listing already sold")]
    AlreadySold { digest: Option<String> },

    /// The chain reported success but no asset landed at the buyer.
    #[error("asset not found in transaction result {digest}")]
    AssetNotFound { digest: String },

    /// Any other on-chain failure, carrying the native message.
    #[error("transaction failed: {message}")]
    Execution {
        digest: Option<String>,
        message: String,
    },

    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl PurchaseError {
    /// Message suitable for showing to the buyer.
    pub fn user_message(&self) -> String {
        match self {
            PurchaseError::AlreadySold { .. } => {
                "This item was just purchased by someone else. Refresh the listings and try another."
                    .to_string()
            }
            PurchaseError::ListingNotFound(_) => {
                "This item is no longer listed. Refresh the listings and try another.".to_string()
            }
            PurchaseError::Execution { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// Blob storage
// ============================================================================

/// A single endpoint's failure, kept for operator diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointFailure {
    pub endpoint: String,
    pub reason: String,
}

impl std::fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.reason)
    }
}

/// Endpoint pool exhaustion.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to store blob: all {tried} publishers failed")]
    StorageConnection {
        tried: usize,
        errors: Vec<EndpointFailure>,
    },

    #[error("blob {blob_id} not found after trying {tried} aggregators")]
    BlobNotFound {
        blob_id: BlobId,
        tried: usize,
        errors: Vec<EndpointFailure>,
    },
}

impl StorageError {
    /// Every per-endpoint failure collected before giving up.
    pub fn failures(&self) -> &[EndpointFailure] {
        match self {
            StorageError::StorageConnection { errors, .. }
            | StorageError::BlobNotFound { errors, .. } => errors,
        }
    }
}

/// Failures of the opaque encryption capability.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("encryption failed: {0}")]
    Encrypt(String),

    #[error("decryption failed: {0}")]
    Decrypt(String),
}

/// Errors from sealing content and publishing it, or fetching and opening it.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Cipher(#[from] CipherError),
}
