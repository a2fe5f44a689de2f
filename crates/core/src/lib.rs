//! NFT-gated video access.
//!
//! Ownership of an on-chain NFT buys a short-lived session that unlocks an
//! encrypted video stored as a blob. The platform wallet pays for purchases.
//!
//! # Architecture
//!
//! ```text
//! PurchaseOrchestrator ──→ PurchaseTransactionBuilder
//!        │                         (pure, one atomic transaction)
//!        └──→ TransactionExecutor  (sponsor signs and submits)
//!
//! SessionManager ──→ OwnershipVerifier ──→ ChainReader
//!        └──→ SessionStore
//!
//! SealedContent ──→ BlobStore + SealCipher
//! ```
//!
//! Chain, storage, and encryption are traits; adapters live in the
//! `gate-chain-sui` and `gate-storage-walrus` crates.
//!
//! # Usage
//!
//! ```ignore
//! use gate_core::{OwnershipVerifier, SessionConfig, SessionManager, InMemorySessionStore};
//!
//! let verifier = OwnershipVerifier::new(chain.clone(), nft_type);
//! let sessions = SessionManager::new(store, verifier, clock, SessionConfig::new(seal_package))?;
//! let session = sessions.create_session(&user, &nft_id, blob_id).await?;
//! let same = sessions.validate_session(&session.session_id)?;
//! ```

pub mod error;
pub mod listings;
pub mod ownership;
pub mod purchase;
pub mod sealed;
pub mod session;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{
    AccessError, AddressError, ChainError, CipherError, ConfigError, ContentError,
    EndpointFailure, PurchaseError, StorageError, StoreError,
};
pub use listings::{ListingRecord, ListingsReader, RevenueShares, RevenueSplit, format_sui};
pub use ownership::OwnershipVerifier;
pub use purchase::{
    MarketplaceConfig, PurchaseOrchestrator, PurchaseReceipt, PurchaseRequest, PurchaseResponse,
    PurchaseTransaction, PurchaseTransactionBuilder, SharedObjectRef, TransactionErrorKind,
    classify_transaction_error,
};
pub use sealed::SealedContent;
pub use session::{InMemorySessionStore, SessionConfig, SessionManager, SessionStore};
pub use traits::{BlobStore, ChainReader, Clock, SealCipher, SystemClock, TransactionExecutor};
pub use types::{
    Address, BlobId, ExecutionOutcome, ExecutionStatus, Listing, ObjectChange, ObjectChangeKind,
    ObjectId, OwnedObject, RawListing, SealIdentity, Session, SessionId, TxDigest,
};

#[cfg(any(test, feature = "mock"))]
pub use mock::{ManualClock, MemoryBlobStore, MockChain, XorCipher};
