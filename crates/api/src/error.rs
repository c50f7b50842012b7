//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use postbox_core::attachment::AttachmentError;

/// Wire names of the fields an upload body must carry.
pub const REQUIRED_FIELDS: [&str; 4] = ["conversationId", "fileName", "fileSize", "mimeType"];

/// API error with its client-facing rendering.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid session.
    #[error("unauthorized")]
    Unauthorized,

    /// Body is not well-formed JSON of the expected shape.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// A required field is absent or empty.
    #[error("missing required fields")]
    MissingFields,

    /// Declared size is over the limit.
    #[error("file size exceeds maximum of {max} bytes")]
    FileTooLarge {
        /// Configured maximum in bytes.
        max: u64,
    },

    /// Object is not in storage.
    #[error("file not found")]
    FileNotFound,

    /// Anything else.
    #[error("{context}: {message}")]
    Internal {
        /// What the handler was doing.
        context: &'static str,
        /// Underlying error text.
        message: String,
    },
}

impl ApiError {
    /// Map a domain error, using `context` as the label of unexpected failures.
    #[must_use]
    pub fn from_attachment(err: AttachmentError, context: &'static str) -> Self {
        match err {
            AttachmentError::FileTooLarge { max, .. } => Self::FileTooLarge { max },
            AttachmentError::FileNotFound { .. } => Self::FileNotFound,
            other @ AttachmentError::Storage(_) => Self::Internal {
                context,
                message: other.to_string(),
            },
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidBody(_)
            | Self::MissingFields
            | Self::FileTooLarge { .. }
            | Self::FileNotFound => StatusCode::BAD_REQUEST,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::Unauthorized => json!({ "error": "Unauthorized" }),
            Self::InvalidBody(message) => json!({
                "error": "Invalid request body",
                "message": message
            }),
            Self::MissingFields => json!({
                "error": "Missing required fields",
                "required": REQUIRED_FIELDS
            }),
            Self::FileTooLarge { max } => json!({
                "error": "File size exceeds maximum allowed size",
                "maxSize": max
            }),
            Self::FileNotFound => json!({ "error": "File not found" }),
            Self::Internal { context, message } => json!({
                "error": context,
                "message": message
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use postbox_core::storage::StorageError;
    use rstest::rstest;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[rstest]
    #[case(ApiError::Unauthorized, StatusCode::UNAUTHORIZED)]
    #[case(ApiError::InvalidBody(String::new()), StatusCode::BAD_REQUEST)]
    #[case(ApiError::MissingFields, StatusCode::BAD_REQUEST)]
    #[case(ApiError::FileTooLarge { max: 1 }, StatusCode::BAD_REQUEST)]
    #[case(ApiError::FileNotFound, StatusCode::BAD_REQUEST)]
    #[case(
        ApiError::Internal { context: "x", message: String::new() },
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn test_status_codes(#[case] err: ApiError, #[case] expected: StatusCode) {
        assert_eq!(err.status_code(), expected);
    }

    #[tokio::test]
    async fn test_unauthorized_body() {
        let (status, body) = render(ApiError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }

    #[tokio::test]
    async fn test_missing_fields_lists_all_required() {
        let (_, body) = render(ApiError::MissingFields).await;
        assert_eq!(
            body["required"],
            json!(["conversationId", "fileName", "fileSize", "mimeType"])
        );
    }

    #[tokio::test]
    async fn test_too_large_reports_limit() {
        let (_, body) = render(ApiError::FileTooLarge { max: 4096 }).await;
        assert_eq!(body["maxSize"], 4096);
    }

    #[test]
    fn test_from_attachment() {
        assert!(matches!(
            ApiError::from_attachment(AttachmentError::file_too_large(10, 5), "ctx"),
            ApiError::FileTooLarge { max: 5 }
        ));
        assert!(matches!(
            ApiError::from_attachment(AttachmentError::file_not_found("k"), "ctx"),
            ApiError::FileNotFound
        ));

        let err = ApiError::from_attachment(
            AttachmentError::Storage(StorageError::PresignNotSupported),
            "Failed to confirm upload",
        );
        match err {
            ApiError::Internal { context, message } => {
                assert_eq!(context, "Failed to confirm upload");
                assert!(message.contains("presign operation not supported"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
