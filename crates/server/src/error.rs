//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gate_core::{AccessError, ChainError, StorageError};
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Error body: `{ success: false, error, code }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Access(AccessError::NotOwned { .. }) => StatusCode::FORBIDDEN,
            ApiError::Access(
                AccessError::SessionNotFound(_) | AccessError::SessionExpired { .. },
            ) => StatusCode::UNAUTHORIZED,
            ApiError::Access(AccessError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Storage(StorageError::BlobNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Chain(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Machine-readable code; the UI branches on the session ones.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Access(AccessError::NotOwned { .. }) => "NOT_OWNED",
            ApiError::Access(AccessError::SessionNotFound(_)) => "SESSION_NOT_FOUND",
            ApiError::Access(AccessError::SessionExpired { .. }) => "SESSION_EXPIRED",
            ApiError::Access(AccessError::Store(_)) => "INTERNAL",
            ApiError::Storage(StorageError::BlobNotFound { .. }) => "BLOB_NOT_FOUND",
            ApiError::Storage(_) => "STORAGE_UNAVAILABLE",
            ApiError::Chain(_) => "CHAIN_UNAVAILABLE",
        }
    }

    fn log(&self) {
        match self {
            ApiError::Access(AccessError::Store(e)) => {
                tracing::error!(error = %e, "Session store failure");
            }
            ApiError::Storage(e) => {
                tracing::error!(error = %e, failures = ?e.failures(), "Blob storage failure");
            }
            ApiError::Chain(e) => {
                tracing::error!(error = %e, "Chain request failed");
            }
            _ => {
                tracing::debug!(error = %self, "Request rejected");
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}
