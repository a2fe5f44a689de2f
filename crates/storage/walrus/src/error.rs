//! Walrus adapter errors.

use std::path::PathBuf;

use thiserror::Error;

/// Per-endpoint failure, classified for the failover loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// HTTP 404: this endpoint does not have (or declines) the content.
    #[error("not found")]
    NotFound,

    /// Timeout, refused connection, or DNS failure.
    #[error("transient: {0}")]
    Transient(String),

    /// Anything else (5xx, malformed body, ...).
    #[error("{0}")]
    Other(String),
}

/// Errors loading the endpoint pool.
#[derive(Debug, Error)]
pub enum PoolConfigError {
    #[error("failed to read pool file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse pool file: {0}")]
    Parse(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("endpoint pool has no {0}s")]
    Empty(&'static str),
}
