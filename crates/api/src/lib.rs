//! HTTP API layer with Axum routes and session handling.
//!
//! This crate provides:
//! - REST API routes
//! - Session lookup and the authenticated-caller extractor
//! - JSON error responses

pub mod error;
pub mod routes;
pub mod session;

use std::iter::once;
use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, http::header::AUTHORIZATION};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

use postbox_core::attachment::AttachmentService;

pub use error::ApiError;
pub use session::{CurrentSession, JwtSessions, SessionProvider};

/// Largest accepted request body. Requests are small JSON documents.
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Resolves the caller's session from request headers.
    pub sessions: Arc<dyn SessionProvider>,
    /// Attachment upload and confirmation service.
    pub attachments: Arc<AttachmentService>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes())
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(SetSensitiveRequestHeadersLayer::new(once(AUTHORIZATION)))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
