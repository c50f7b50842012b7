//! Session lookup for protected routes.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::debug;

use crate::{AppState, error::ApiError};
use postbox_shared::{JwtService, Session};

/// Resolves the caller's session from request headers.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The session carried by `headers`, or `None` when the caller is anonymous
    /// or presented invalid credentials.
    async fn session(&self, headers: &HeaderMap) -> Option<Session>;
}

/// Sessions backed by bearer access tokens.
#[derive(Debug)]
pub struct JwtSessions {
    jwt: JwtService,
}

impl JwtSessions {
    /// Create a provider validating tokens with `jwt`.
    #[must_use]
    pub const fn new(jwt: JwtService) -> Self {
        Self { jwt }
    }
}

#[async_trait]
impl SessionProvider for JwtSessions {
    async fn session(&self, headers: &HeaderMap) -> Option<Session> {
        let Authorization(bearer) = headers.typed_get::<Authorization<Bearer>>()?;

        match self.jwt.validate_token(bearer.token()) {
            Ok(claims) => Some(claims.into()),
            Err(e) => {
                debug!(error = %e, "Rejected access token");
                None
            }
        }
    }
}

/// Extractor for the authenticated caller.
///
/// Rejects with 401 before any other extractor (including the body) runs,
/// so place it first in handler arguments.
///
/// ```ignore
/// async fn handler(CurrentSession(session): CurrentSession) -> impl IntoResponse {
///     let user_id = session.user_id;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state
            .sessions
            .session(&parts.headers)
            .await
            .map(CurrentSession)
            .ok_or(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header::AUTHORIZATION};
    use postbox_shared::JwtConfig;
    use uuid::Uuid;

    fn provider() -> JwtSessions {
        JwtSessions::new(JwtService::new(JwtConfig::default()))
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn test_valid_token_yields_session() {
        let sessions = provider();
        let user_id = Uuid::new_v4();
        let token = sessions.jwt.issue_token(user_id, "member", 900).unwrap();

        let session = sessions.session(&bearer(&token)).await.unwrap();
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.role, "member");
    }

    #[tokio::test]
    async fn test_missing_header_is_anonymous() {
        assert!(provider().session(&HeaderMap::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_garbage_token_is_anonymous() {
        assert!(provider().session(&bearer("not.a.jwt")).await.is_none());
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(provider().session(&headers).await.is_none());
    }
}
