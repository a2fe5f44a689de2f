//! HTTP handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use gate_core::{
    Address, BlobId, ListingRecord, PurchaseError, PurchaseRequest, PurchaseResponse, SealIdentity,
    Session, SessionId,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Purchase
// ============================================================================

/// POST /purchase
///
/// Orchestrator outcomes, including lost races, are `200` with
/// `success: false`; only a malformed request is a `400`, and it still
/// carries the `{success, error}` body.
pub async fn purchase(
    State(state): State<AppState>,
    payload: Result<Json<PurchaseRequest>, JsonRejection>,
) -> (StatusCode, Json<PurchaseResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let e = PurchaseError::InvalidRequest(rejection.body_text());
            return (StatusCode::BAD_REQUEST, Json(PurchaseResponse::failed(&e)));
        }
    };
    if let Err(e) = request.validate() {
        return (StatusCode::BAD_REQUEST, Json(PurchaseResponse::failed(&e)));
    }
    (StatusCode::OK, Json(state.purchases.respond(&request).await))
}

// ============================================================================
// Watch
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchRequest {
    pub user_address: String,
    pub nft_id: String,
    pub blob_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchResponse {
    pub success: bool,
    pub session: Session,
}

/// POST /watch
pub async fn watch(
    State(state): State<AppState>,
    payload: Result<Json<WatchRequest>, JsonRejection>,
) -> ApiResult<Json<WatchResponse>> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let user = parse_address("userAddress", &request.user_address)?;
    let nft_id = parse_address("nftId", &request.nft_id)?;
    if request.blob_id.trim().is_empty() {
        return Err(ApiError::BadRequest("blobId is required".to_string()));
    }

    let session = state
        .sessions
        .create_session(&user, &nft_id, BlobId::new(request.blob_id.trim()))
        .await?;

    Ok(Json(WatchResponse {
        success: true,
        session,
    }))
}

fn parse_address(field: &str, raw: &str) -> ApiResult<Address> {
    Address::parse(raw).map_err(|e| ApiError::BadRequest(format!("invalid {field}: {e}")))
}

// ============================================================================
// Video
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    pub session: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub blob_id: BlobId,
    pub decryption: SealIdentity,
}

/// GET /video?session=<id>
pub async fn video(
    State(state): State<AppState>,
    Query(query): Query<VideoQuery>,
) -> ApiResult<Json<VideoResponse>> {
    let session = state
        .sessions
        .validate_session(&SessionId::new(query.session))?;

    Ok(Json(VideoResponse {
        success: true,
        video_url: state.blobs.blob_url(&session.blob_id),
        blob_id: session.blob_id,
        decryption: session.decryption,
    }))
}

/// GET /video/content?session=<id>
///
/// The encrypted payload, resolved through the blob store.
pub async fn video_content(
    State(state): State<AppState>,
    Query(query): Query<VideoQuery>,
) -> ApiResult<impl IntoResponse> {
    let session = state
        .sessions
        .validate_session(&SessionId::new(query.session))?;
    let data = state.blobs.get_encrypted_blob(&session.blob_id).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        data,
    ))
}

// ============================================================================
// Listings
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ListingsResponse {
    pub listings: Vec<ListingRecord>,
}

/// GET /listings
pub async fn listings(State(state): State<AppState>) -> ApiResult<Json<ListingsResponse>> {
    let listings = state.listings.list().await?;
    Ok(Json(ListingsResponse { listings }))
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub rpc_connected: bool,
    /// MIST as a decimal string; absent when the balance could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor_balance: Option<String>,
    pub active_sessions: usize,
    pub timestamp: String,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let rpc_connected = match state.chain.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Chain RPC unreachable");
            false
        }
    };

    let sponsor_balance = match state.executor.sponsor_balance().await {
        Ok(balance) => Some(balance.to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Sponsor balance unavailable");
            None
        }
    };

    let active_sessions = state.sessions.active_session_count().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Session count unavailable");
        0
    });

    let status = if rpc_connected && sponsor_balance.is_some() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        rpc_connected,
        sponsor_balance,
        active_sessions,
        timestamp: state.clock.now().to_rfc3339(),
    })
}
