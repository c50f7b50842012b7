//! JWT token generation and validation.

use jsonwebtoken::{DecodingKey, Validation, decode};
use thiserror::Error;

#[cfg(any(test, feature = "test-util"))]
use uuid::Uuid;

use crate::auth::Claims;
use crate::config::JwtSettings;

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret the issuer signs access tokens with.
    pub secret: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
        }
    }
}

impl From<&JwtSettings> for JwtConfig {
    fn from(settings: &JwtSettings) -> Self {
        Self {
            secret: settings.secret.clone(),
        }
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,
}

/// Validates access tokens issued by the identity service.
///
/// Postbox never issues tokens in production; [`JwtService::issue_token`]
/// exists for tests only.
#[derive(Clone)]
pub struct JwtService {
    #[cfg(any(test, feature = "test-util"))]
    encoding_key: jsonwebtoken::EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("secret", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        Self {
            #[cfg(any(test, feature = "test-util"))]
            encoding_key: jsonwebtoken::EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
        }
    }

    /// Issues an access token living `ttl_secs` seconds (negative for an
    /// already expired token).
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    #[cfg(any(test, feature = "test-util"))]
    pub fn issue_token(&self, user_id: Uuid, role: &str, ttl_secs: i64) -> Result<String, JwtError> {
        let expires_at = chrono::Utc::now() + chrono::Duration::seconds(ttl_secs);
        let claims = Claims::new(user_id, role, expires_at);

        jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validates and decodes a token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired.
    /// Returns `JwtError::DecodingError` if the token is malformed or the
    /// signature does not match.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })
    }
}
