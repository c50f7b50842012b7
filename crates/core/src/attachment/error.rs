//! Attachment error types.

use thiserror::Error;

use crate::fetch::FetchError;
use crate::storage::StorageError;
use crate::thumbnail::ThumbnailError;

/// Attachment operation errors.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// Declared size is over the configured limit.
    #[error("file too large: {size} bytes exceeds maximum {max} bytes")]
    FileTooLarge {
        /// Declared file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Upload not verified - object not found in storage.
    #[error("file not found in storage: {key}")]
    FileNotFound {
        /// Storage key that was checked.
        key: String,
    },

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AttachmentError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create a file not found error.
    #[must_use]
    pub fn file_not_found(key: impl Into<String>) -> Self {
        Self::FileNotFound { key: key.into() }
    }
}

/// Failure of the best-effort thumbnail step. Never fails a confirmation.
#[derive(Debug, Error)]
pub enum ThumbnailStepError {
    /// Could not issue the URL used to read the original.
    #[error("could not presign original: {0}")]
    Presign(StorageError),

    /// Could not download the original.
    #[error("could not fetch original: {0}")]
    Fetch(#[from] FetchError),

    /// Generator failed.
    #[error(transparent)]
    Generate(#[from] ThumbnailError),
}
