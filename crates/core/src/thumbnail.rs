//! Thumbnail generation for image attachments.
//!
//! Thumbnails are PNGs bounded by a square of `max_dimension` pixels,
//! aspect ratio preserved, stored next to the original under `thumbnail/`.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use image::ImageFormat;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::attachment::thumbnail_key;
use crate::storage::{ObjectStore, StorageError};

/// Thumbnail generation errors.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    /// Source bytes could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// Thumbnail could not be encoded.
    #[error("failed to encode thumbnail: {0}")]
    Encode(String),

    /// Writing or addressing the thumbnail failed.
    #[error("thumbnail storage failed: {0}")]
    Storage(#[from] StorageError),

    /// Blocking worker panicked or was cancelled.
    #[error("thumbnail worker failed: {0}")]
    Task(String),
}

/// Produces a thumbnail for a stored original.
#[async_trait]
pub trait ThumbnailGenerator: Send + Sync {
    /// Render and persist a thumbnail for the object at `key`.
    ///
    /// Returns the URL of the thumbnail, or `None` when the content is not
    /// something a thumbnail can be made from.
    async fn generate(
        &self,
        bucket: &str,
        key: &str,
        content: Bytes,
    ) -> Result<Option<String>, ThumbnailError>;
}

/// Thumbnail settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailConfig {
    /// Longest edge of a thumbnail in pixels.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// Public base URL for thumbnails, e.g. a CDN in front of the bucket.
    /// When unset, thumbnails are returned as presigned URLs.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Lifetime of presigned thumbnail URLs in seconds.
    #[serde(default = "default_url_ttl_secs")]
    pub url_ttl_secs: u64,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            public_base_url: None,
            url_ttl_secs: default_url_ttl_secs(),
        }
    }
}

fn default_max_dimension() -> u32 {
    256
}

fn default_url_ttl_secs() -> u64 {
    3600
}

/// [`ThumbnailGenerator`] using the `image` crate and an [`ObjectStore`].
pub struct ImageThumbnailer {
    store: Arc<dyn ObjectStore>,
    config: ThumbnailConfig,
}

impl ImageThumbnailer {
    /// Create a thumbnailer writing into `store`.
    ///
    /// A `max_dimension` of zero is raised to one pixel.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, mut config: ThumbnailConfig) -> Self {
        if config.max_dimension == 0 {
            warn!("thumbnails.max_dimension is 0, using 1");
            config.max_dimension = 1;
        }
        Self { store, config }
    }

    async fn thumbnail_url(&self, bucket: &str, key: &str) -> Result<String, ThumbnailError> {
        if let Some(base) = &self.config.public_base_url {
            return Ok(format!("{}/{bucket}/{key}", base.trim_end_matches('/')));
        }

        let ttl = Duration::from_secs(self.config.url_ttl_secs);
        Ok(self.store.presign_read(key, ttl).await?.url)
    }
}

#[async_trait]
impl ThumbnailGenerator for ImageThumbnailer {
    async fn generate(
        &self,
        bucket: &str,
        key: &str,
        content: Bytes,
    ) -> Result<Option<String>, ThumbnailError> {
        let Ok(format) = image::guess_format(&content) else {
            debug!(key = %key, "Unrecognised image format, skipping thumbnail");
            return Ok(None);
        };

        let max_dimension = self.config.max_dimension;
        let png = tokio::task::spawn_blocking(move || render_png(&content, format, max_dimension))
            .await
            .map_err(|e| ThumbnailError::Task(e.to_string()))??;

        let thumb_key = thumbnail_key(key);
        self.store
            .write(&thumb_key, Bytes::from(png), "image/png")
            .await?;

        debug!(key = %key, thumbnail_key = %thumb_key, "Thumbnail stored");

        self.thumbnail_url(bucket, &thumb_key).await.map(Some)
    }
}

/// Decode, downscale and re-encode as PNG.
fn render_png(
    content: &[u8],
    format: ImageFormat,
    max_dimension: u32,
) -> Result<Vec<u8>, ThumbnailError> {
    let image = image::load_from_memory_with_format(content, format)
        .map_err(|e| ThumbnailError::Decode(e.to_string()))?;

    let thumbnail = if image.width() > max_dimension || image.height() > max_dimension {
        image.thumbnail(max_dimension, max_dimension)
    } else {
        image
    };

    let mut out = Cursor::new(Vec::new());
    thumbnail
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| ThumbnailError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}
