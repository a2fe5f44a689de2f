//! Walrus blob storage with endpoint-pool failover.
//!
//! ```text
//! BlobResolver ──(ordered, first success wins)──→ BlobTransport
//!      │                                             └── HttpTransport (reqwest)
//!      └── EndpointPool ← PoolConfig (TOML + env overrides)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use gate_storage_walrus::{BlobResolver, PoolConfig};
//!
//! let resolver = BlobResolver::from_config(&PoolConfig::from_env()?)?;
//! let blob_id = resolver.upload(&ciphertext).await?;
//! let bytes = resolver.download(&blob_id).await?;
//! ```

pub mod error;
pub mod pool;
pub mod resolver;
pub mod transport;
pub mod types;

pub use error::{EndpointError, PoolConfigError};
pub use pool::{EndpointPool, PoolConfig};
pub use resolver::BlobResolver;
pub use transport::{BlobTransport, HttpTransport};
pub use types::{AlreadyCertified, BlobObject, BlobResponse, NewlyCreated};
