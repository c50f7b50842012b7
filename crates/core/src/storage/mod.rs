//! Object storage for attachments using Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, DigitalOcean Spaces
//! - Azure Blob Storage
//! - Local filesystem (development only)
//! - In-memory (development and tests, cannot presign)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   ObjectStore (port)                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ exists("key")              │ presign_read("key", ttl)           │
//! │ write("key", data, type)   │ presign_write("key", ttl, type)    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │              StorageService (Apache OpenDAL)                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{ObjectStore, PresignedUrl, StorageService};

#[cfg(any(test, feature = "test-util"))]
pub(crate) use service::expiry_from_now;
