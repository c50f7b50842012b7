//! Attachment service implementation.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use super::error::{AttachmentError, ThumbnailStepError};
use super::key::storage_key;
use super::types::{AttachmentKind, ConfirmedAttachment, UploadDetails, UploadTicket};
use crate::fetch::ByteFetcher;
use crate::storage::{ObjectStore, StorageConfig};
use crate::thumbnail::ThumbnailGenerator;

/// Warning attached when the generator produced nothing.
pub const NO_THUMBNAIL_WARNING: &str = "Thumbnail generation returned no URL";

/// Size limit and URL lifetimes applied by the attachment service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentPolicy {
    /// Maximum declared file size in bytes.
    pub max_file_size: u64,
    /// Lifetime of upload URLs, also used for the one-shot server-side
    /// fetch of an original.
    pub upload_url_ttl: Duration,
    /// Lifetime of URLs handed to clients for display.
    pub download_url_ttl: Duration,
}

impl From<&StorageConfig> for AttachmentPolicy {
    fn from(config: &StorageConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            upload_url_ttl: config.upload_ttl(),
            download_url_ttl: config.download_ttl(),
        }
    }
}

impl AttachmentPolicy {
    /// Reject sizes over the limit.
    pub fn check_size(&self, size: u64) -> Result<(), AttachmentError> {
        if size > self.max_file_size {
            return Err(AttachmentError::file_too_large(size, self.max_file_size));
        }
        Ok(())
    }
}

/// Attachment service for issuing upload URLs and confirming uploads.
pub struct AttachmentService {
    store: Arc<dyn ObjectStore>,
    fetcher: Arc<dyn ByteFetcher>,
    thumbnails: Arc<dyn ThumbnailGenerator>,
    policy: AttachmentPolicy,
}

impl AttachmentService {
    /// Create a new attachment service.
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        fetcher: Arc<dyn ByteFetcher>,
        thumbnails: Arc<dyn ThumbnailGenerator>,
        policy: AttachmentPolicy,
    ) -> Self {
        Self {
            store,
            fetcher,
            thumbnails,
            policy,
        }
    }

    /// Request an upload URL for a new attachment.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File size exceeds limit
    /// - Storage service cannot presign
    pub async fn request_upload(
        &self,
        details: UploadDetails,
    ) -> Result<UploadTicket, AttachmentError> {
        self.policy.check_size(details.file_size)?;

        let file_id = Uuid::new_v4().to_string();
        let key = storage_key(&details.conversation_id, &file_id, &details.file_name);

        let presigned = self
            .store
            .presign_write(&key, self.policy.upload_url_ttl, &details.mime_type)
            .await?;

        Ok(UploadTicket {
            file_id,
            storage_key: key,
            upload_url: presigned.url,
            method: presigned.method,
            headers: presigned.headers,
            expires_at: presigned.expires_at,
        })
    }

    /// Confirm that a file was uploaded and describe it.
    ///
    /// Image attachments get a thumbnail on a best-effort basis: any
    /// failure there becomes `warning` on the result instead of an error.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File size exceeds limit
    /// - Object is missing from storage, or the existence check failed
    /// - The download URL cannot be issued
    pub async fn confirm_upload(
        &self,
        file_id: &str,
        details: UploadDetails,
    ) -> Result<ConfirmedAttachment, AttachmentError> {
        self.policy.check_size(details.file_size)?;

        let key = storage_key(&details.conversation_id, file_id, &details.file_name);
        self.verify_exists(&key).await?;

        let kind = AttachmentKind::from_mime(&details.mime_type);

        let (thumbnail_url, warning) = if kind.supports_thumbnail() {
            match self.derive_thumbnail(&key).await {
                Ok(Some(url)) => (Some(url), None),
                Ok(None) => {
                    warn!(file_id = %file_id, key = %key, "Thumbnail generation returned no URL");
                    (None, Some(NO_THUMBNAIL_WARNING.to_string()))
                }
                Err(e) => {
                    warn!(file_id = %file_id, key = %key, error = %e, "Thumbnail generation failed");
                    (None, Some(format!("Thumbnail generation failed: {e}")))
                }
            }
        } else {
            (None, None)
        };

        let download = self
            .store
            .presign_read(&key, self.policy.download_url_ttl)
            .await?;

        Ok(ConfirmedAttachment {
            id: file_id.to_string(),
            kind,
            name: details.file_name,
            size: details.file_size,
            mime_type: details.mime_type,
            url: download.url,
            thumbnail_url,
            warning,
        })
    }

    /// Absence and storage failures are both reported as not found.
    async fn verify_exists(&self, key: &str) -> Result<(), AttachmentError> {
        match self.store.exists(key).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AttachmentError::file_not_found(key)),
            Err(e) => {
                warn!(key = %key, error = %e, "Existence check failed");
                Err(AttachmentError::file_not_found(key))
            }
        }
    }

    async fn derive_thumbnail(&self, key: &str) -> Result<Option<String>, ThumbnailStepError> {
        let source = self
            .store
            .presign_read(key, self.policy.upload_url_ttl)
            .await
            .map_err(ThumbnailStepError::Presign)?;

        let content = self.fetcher.fetch(&source.url).await?;
        debug!(key = %key, bytes = content.len(), "Fetched original for thumbnail");

        Ok(self
            .thumbnails
            .generate(self.store.bucket(), key, content)
            .await?)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    // A declared size is accepted exactly when it is within the limit.
    proptest! {
        #[test]
        fn prop_size_limit(max in 1u64..50_000_000, size in 0u64..100_000_000) {
            let policy = AttachmentPolicy {
                max_file_size: max,
                upload_url_ttl: Duration::from_secs(900),
                download_url_ttl: Duration::from_secs(3600),
            };

            match policy.check_size(size) {
                Ok(()) => prop_assert!(size <= max),
                Err(AttachmentError::FileTooLarge { size: s, max: m }) => {
                    prop_assert!(size > max);
                    prop_assert_eq!(s, size);
                    prop_assert_eq!(m, max);
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }
}
