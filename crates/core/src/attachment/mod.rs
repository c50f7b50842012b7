//! Attachment service for conversation file uploads.
//!
//! This module provides business logic for file attachments including:
//! - Upload URL issuance
//! - Upload confirmation against storage
//! - Attachment classification by MIME type
//! - Best-effort thumbnails for images

mod error;
mod key;
mod service;
mod types;

pub use error::{AttachmentError, ThumbnailStepError};
pub use key::{storage_key, thumbnail_key};
pub use service::{AttachmentPolicy, AttachmentService, NO_THUMBNAIL_WARNING};
pub use types::{AttachmentKind, ConfirmedAttachment, UploadDetails, UploadTicket};
