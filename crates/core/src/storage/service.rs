//! Storage service implementation using Apache OpenDAL.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use opendal::{ErrorKind, Operator, services};
use tracing::warn;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Presigned URL for upload or download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method to use (PUT for upload, GET for download).
    pub method: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
    /// Required headers for the request.
    pub headers: HashMap<String, String>,
}

impl PresignedUrl {
    fn expiring_in(url: String, method: String, ttl: Duration) -> Self {
        Self {
            url,
            method,
            expires_at: expiry_from_now(ttl),
            headers: HashMap::new(),
        }
    }
}

/// Object storage operations used by the attachment flow.
///
/// Implemented by [`StorageService`]; tests substitute in-process fakes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket or container the keys live in.
    fn bucket(&self) -> &str;

    /// Check whether an object exists.
    ///
    /// A missing object is `Ok(false)`; any other failure is an error.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Issue a time-limited GET URL for an object.
    async fn presign_read(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError>;

    /// Issue a time-limited PUT URL for an object.
    async fn presign_write(
        &self,
        key: &str,
        ttl: Duration,
        content_type: &str,
    ) -> Result<PresignedUrl, StorageError>;

    /// Store an object.
    async fn write(
        &self,
        key: &str,
        content: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;
}

/// Storage service for file attachments.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService")
            .field("provider", &self.config.provider.name())
            .field("bucket", &self.config.provider.bucket())
            .finish_non_exhaustive()
    }
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        if !config.provider.supports_presign() {
            warn!(
                provider = config.provider.name(),
                "Storage provider cannot presign URLs; upload and confirm requests will fail"
            );
        }
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()
                .pipe(Ok),
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    fn bucket(&self) -> &str {
        self.config.provider.bucket()
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.operator.stat(key).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::from(e)),
        }
    }

    async fn presign_read(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError> {
        let presigned = self
            .operator
            .presign_read(key, ttl)
            .await
            .map_err(StorageError::from)?;

        Ok(PresignedUrl::expiring_in(
            presigned.uri().to_string(),
            presigned.method().to_string(),
            ttl,
        ))
    }

    async fn presign_write(
        &self,
        key: &str,
        ttl: Duration,
        content_type: &str,
    ) -> Result<PresignedUrl, StorageError> {
        let presigned = self
            .operator
            .presign_write(key, ttl)
            .await
            .map_err(StorageError::from)?;

        let mut url = PresignedUrl::expiring_in(
            presigned.uri().to_string(),
            presigned.method().to_string(),
            ttl,
        );
        url.headers
            .insert("Content-Type".to_string(), content_type.to_string());
        Ok(url)
    }

    async fn write(
        &self,
        key: &str,
        content: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.operator
            .write_with(key, content)
            .content_type(content_type)
            .await?;
        Ok(())
    }
}

/// Saturates at the latest representable instant.
pub(crate) fn expiry_from_now(ttl: Duration) -> DateTime<Utc> {
    i64::try_from(ttl.as_secs())
        .ok()
        .and_then(chrono::TimeDelta::try_seconds)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}
