//! Collaborator traits consumed by the core.
//!
//! The core never talks to a chain SDK, an HTTP client, or a key server
//! directly. Adapters implement these traits:
//!
//! ```text
//! ChainReader          ← owned objects, listings, shared versions (read-only)
//! TransactionExecutor  ← sign-and-execute with the sponsor key
//! BlobStore            ← encrypted payload upload/download
//! SealCipher           ← opaque identity-based encryption capability
//! Clock                ← wall clock (manual in tests)
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{ChainError, CipherError, StorageError};
use crate::purchase::PurchaseTransaction;
use crate::types::{
    Address, BlobId, ExecutionOutcome, Listing, ObjectId, OwnedObject, RawListing, SealIdentity,
};

// ============================================================================
// Chain
// ============================================================================

/// Read-only chain queries.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// All objects of `struct_type` owned by `owner` (every page).
    async fn owned_objects(
        &self,
        owner: &Address,
        struct_type: &str,
    ) -> Result<Vec<OwnedObject>, ChainError>;

    /// Current listing of `nft_id` in `marketplace`, or `None` if not listed.
    async fn listing(
        &self,
        marketplace: &ObjectId,
        nft_id: &ObjectId,
    ) -> Result<Option<Listing>, ChainError>;

    /// Every listing in `marketplace` with the item's display fields.
    async fn listings(&self, marketplace: &ObjectId) -> Result<Vec<RawListing>, ChainError>;

    /// Initial shared version of a shared object, or `None` if the object
    /// is not shared.
    async fn shared_version(&self, object_id: &ObjectId) -> Result<Option<u64>, ChainError>;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<(), ChainError>;
}

/// Transaction submission paid for and signed by the sponsor wallet.
#[async_trait]
pub trait TransactionExecutor: Send + Sync {
    /// Sign with the sponsor key, submit, and wait for effects and object
    /// changes. Once this is called the purchase may land on chain even if
    /// the caller stops waiting.
    async fn execute_purchase(
        &self,
        transaction: PurchaseTransaction,
    ) -> Result<ExecutionOutcome, ChainError>;

    /// Address paying gas and payments.
    fn sponsor_address(&self) -> Address;

    /// Sponsor balance in MIST.
    async fn sponsor_balance(&self) -> Result<u64, ChainError>;
}

// ============================================================================
// Storage and encryption
// ============================================================================

/// Encrypted payload storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload_blob(&self, data: Vec<u8>) -> Result<BlobId, StorageError>;

    async fn get_encrypted_blob(&self, blob_id: &BlobId) -> Result<Vec<u8>, StorageError>;

    /// Public URL a client can fetch the blob from, if the store has one.
    fn blob_url(&self, blob_id: &BlobId) -> Option<String>;
}

/// Identity-based encryption with threshold key servers.
///
/// Implementations wrap an external scheme; the core only passes bytes
/// through.
#[async_trait]
pub trait SealCipher: Send + Sync {
    async fn encrypt(&self, identity: &SealIdentity, plaintext: &[u8])
    -> Result<Vec<u8>, CipherError>;

    async fn decrypt(
        &self,
        identity: &SealIdentity,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CipherError>;
}

// ============================================================================
// Time
// ============================================================================

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
