//! Server settings.

use serde::Deserialize;

use postbox_core::fetch::FetchConfig;
use postbox_core::storage::StorageConfig;
use postbox_core::thumbnail::ThumbnailConfig;
use postbox_shared::{JwtSettings, LogConfig, ServerConfig};

/// Everything the server reads at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Listen address.
    #[serde(default)]
    pub server: ServerConfig,
    /// Access token validation.
    pub jwt: JwtSettings,
    /// Log output.
    #[serde(default)]
    pub log: LogConfig,
    /// Object storage backend and upload limits.
    pub storage: StorageConfig,
    /// Thumbnail rendering.
    #[serde(default)]
    pub thumbnails: ThumbnailConfig,
    /// Fetching originals for thumbnailing.
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl Settings {
    /// Load from `config/` files and `POSTBOX__*` environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        postbox_shared::config::load()
    }
}
