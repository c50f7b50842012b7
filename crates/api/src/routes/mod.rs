//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod attachments;
pub mod health;

/// Creates the API router with all routes.
///
/// Protected handlers take [`crate::CurrentSession`] as their first argument.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(attachments::routes())
}
