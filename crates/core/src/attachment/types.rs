//! Attachment types and data structures.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attachment classification derived from the MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    /// Raster or vector image.
    Image,
    /// Video clip.
    Video,
    /// Audio recording.
    Audio,
    /// PDF, text or office document.
    Document,
    /// Anything else.
    #[default]
    Other,
}

/// Non-`text/*` MIME types classified as documents.
const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/rtf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/vnd.oasis.opendocument.text",
    "application/vnd.oasis.opendocument.spreadsheet",
    "application/vnd.oasis.opendocument.presentation",
];

impl AttachmentKind {
    /// Classify a MIME type. Case and parameters (`; charset=...`) are ignored.
    #[must_use]
    pub fn from_mime(mime_type: &str) -> Self {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.split_once('/') {
            Some(("image", _)) => Self::Image,
            Some(("video", _)) => Self::Video,
            Some(("audio", _)) => Self::Audio,
            Some(("text", _)) => Self::Document,
            _ if DOCUMENT_MIME_TYPES.contains(&essence.as_str()) => Self::Document,
            _ => Self::Other,
        }
    }

    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Other => "other",
        }
    }

    /// Whether a thumbnail should be derived for this kind.
    #[must_use]
    pub fn supports_thumbnail(&self) -> bool {
        matches!(self, Self::Image)
    }
}

/// Client-declared details of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDetails {
    /// Conversation the file belongs to.
    pub conversation_id: String,
    /// Original filename.
    pub file_name: String,
    /// File size in bytes.
    pub file_size: u64,
    /// MIME type of the file.
    pub mime_type: String,
}

/// A confirmed attachment, ready to hand back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedAttachment {
    /// File ID.
    pub id: String,
    /// Classification.
    pub kind: AttachmentKind,
    /// Original filename.
    pub name: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME type.
    pub mime_type: String,
    /// Presigned download URL.
    pub url: String,
    /// Thumbnail URL, images only.
    pub thumbnail_url: Option<String>,
    /// Why a thumbnail is missing, if one was attempted and failed.
    pub warning: Option<String>,
}

/// Result of requesting an upload URL.
#[derive(Debug, Clone)]
pub struct UploadTicket {
    /// Generated file ID.
    pub file_id: String,
    /// Storage key the client must upload to.
    pub storage_key: String,
    /// Presigned upload URL.
    pub upload_url: String,
    /// HTTP method to use (PUT).
    pub method: String,
    /// Required headers for the upload.
    pub headers: HashMap<String, String>,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
}
