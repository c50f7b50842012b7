//! Conversation attachment routes.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use tracing::{debug, error, info};

use crate::{AppState, error::ApiError, session::CurrentSession};
use postbox_core::attachment::{
    AttachmentError, AttachmentKind, ConfirmedAttachment, UploadDetails, UploadTicket,
};

const CONFIRM_FAILED: &str = "Failed to confirm upload";
const UPLOAD_FAILED: &str = "Failed to create upload URL";

/// Creates the attachment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/messaging/attachments/upload", post(request_upload))
        .route(
            "/messaging/attachments/{file_id}/confirm",
            post(confirm_upload),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body shared by the upload and confirm endpoints.
///
/// Every field is optional at the wire level so that absent fields report
/// as missing rather than as a malformed body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequestBody {
    /// Conversation the file belongs to.
    pub conversation_id: Option<String>,
    /// Original filename.
    pub file_name: Option<String>,
    /// Declared size in bytes. Any JSON number is accepted here so that
    /// oversized values reach the size limit instead of failing to parse.
    pub file_size: Option<Number>,
    /// Declared MIME type.
    pub mime_type: Option<String>,
}

impl UploadRequestBody {
    /// Validate presence of every field. Empty strings and non-positive
    /// sizes count as missing.
    pub fn into_details(self) -> Result<UploadDetails, ApiError> {
        let file_size = self.file_size.as_ref().and_then(declared_size);

        match (
            present(self.conversation_id),
            present(self.file_name),
            file_size,
            present(self.mime_type),
        ) {
            (Some(conversation_id), Some(file_name), Some(file_size), Some(mime_type)) => {
                Ok(UploadDetails {
                    conversation_id,
                    file_name,
                    file_size,
                    mime_type,
                })
            }
            _ => Err(ApiError::MissingFields),
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Positive whole sizes, saturating at `u64::MAX`. Zero, negatives and
/// fractions are not usable declarations.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn declared_size(number: &Number) -> Option<u64> {
    if let Some(size) = number.as_u64() {
        return (size > 0).then_some(size);
    }
    if number.is_i64() {
        return None;
    }
    number
        .as_f64()
        .filter(|size| size.is_finite() && *size >= 1.0 && size.fract() == 0.0)
        .map(|size| size as u64)
}

/// Attachment descriptor returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResponse {
    /// File ID.
    pub id: String,
    /// Classification.
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    /// Original filename.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type.
    pub mime_type: String,
    /// Time-limited download URL.
    pub url: String,
    /// Thumbnail URL, images only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// Response for a confirmed upload.
#[derive(Debug, Serialize)]
pub struct ConfirmUploadResponse {
    /// The confirmed attachment.
    pub attachment: AttachmentResponse,
    /// Why no thumbnail was produced for an image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<ConfirmedAttachment> for ConfirmUploadResponse {
    fn from(confirmed: ConfirmedAttachment) -> Self {
        Self {
            attachment: AttachmentResponse {
                id: confirmed.id,
                kind: confirmed.kind,
                name: confirmed.name,
                size: confirmed.size,
                mime_type: confirmed.mime_type,
                url: confirmed.url,
                thumbnail_url: confirmed.thumbnail_url,
            },
            warning: confirmed.warning,
        }
    }
}

/// Response for upload URL request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTicketResponse {
    /// Generated file ID, used later to confirm.
    pub file_id: String,
    /// Storage key the URL writes to.
    pub storage_key: String,
    /// Presigned upload URL.
    pub upload_url: String,
    /// HTTP method to use (PUT).
    pub method: String,
    /// Required headers for the upload.
    pub headers: HashMap<String, String>,
    /// When the URL expires (RFC 3339).
    pub expires_at: String,
}

impl From<UploadTicket> for UploadTicketResponse {
    fn from(ticket: UploadTicket) -> Self {
        Self {
            file_id: ticket.file_id,
            storage_key: ticket.storage_key,
            upload_url: ticket.upload_url,
            method: ticket.method,
            headers: ticket.headers,
            expires_at: ticket.expires_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_body(
    payload: Result<Json<UploadRequestBody>, JsonRejection>,
) -> Result<UploadDetails, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        debug!(error = %rejection, "Rejected request body");
        ApiError::InvalidBody(rejection.body_text())
    })?;
    body.into_details()
}

fn map_error(err: AttachmentError, context: &'static str) -> ApiError {
    match &err {
        AttachmentError::Storage(e) => error!(error = %e, "{context}"),
        other => debug!(error = %other, "{context}"),
    }
    ApiError::from_attachment(err, context)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/messaging/attachments/upload`
/// Issue a presigned upload URL and a fresh file ID.
async fn request_upload(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    payload: Result<Json<UploadRequestBody>, JsonRejection>,
) -> Result<Json<UploadTicketResponse>, ApiError> {
    let details = parse_body(payload)?;

    let ticket = state
        .attachments
        .request_upload(details)
        .await
        .map_err(|e| map_error(e, UPLOAD_FAILED))?;

    info!(
        user_id = %session.user_id,
        file_id = %ticket.file_id,
        "Upload URL issued"
    );

    Ok(Json(ticket.into()))
}

/// POST `/messaging/attachments/{file_id}/confirm`
/// Confirm an uploaded file and describe it.
async fn confirm_upload(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    payload: Result<Json<UploadRequestBody>, JsonRejection>,
) -> Result<Json<ConfirmUploadResponse>, ApiError> {
    let details = parse_body(payload)?;

    let confirmed = state
        .attachments
        .confirm_upload(&file_id, details)
        .await
        .map_err(|e| map_error(e, CONFIRM_FAILED))?;

    info!(
        user_id = %session.user_id,
        file_id = %file_id,
        kind = confirmed.kind.as_str(),
        thumbnail = confirmed.thumbnail_url.is_some(),
        "Attachment confirmed"
    );

    Ok(Json(confirmed.into()))
}
