//! HTTP surface for gated video access.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `POST /purchase` | sponsored kiosk purchase |
//! | `POST /watch` | ownership-gated session |
//! | `GET /video?session=` | blob URL and decryption material |
//! | `GET /video/content?session=` | encrypted payload through the blob pool |
//! | `GET /listings` | marketplace listings by price |
//! | `GET /health` | RPC, sponsor, and session status |

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod state;
pub mod sweep;

use axum::Router;
use axum::http::{Method, header};
use axum::routing::{get, post};
use tower_http::cors::{AllowHeaders, AllowMethods, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{ServerConfig, marketplace_from_env, session_from_env};
pub use error::{ApiError, ApiResult};
pub use state::{AppState, Collaborators};
pub use sweep::spawn_session_sweep;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([header::CONTENT_TYPE, header::ACCEPT]));

    Router::new()
        .route("/purchase", post(handlers::purchase))
        .route("/watch", post(handlers::watch))
        .route("/video", get(handlers::video))
        .route("/video/content", get(handlers::video_content))
        .route("/listings", get(handlers::listings))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
