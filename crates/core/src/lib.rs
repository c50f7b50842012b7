//! Core attachment logic for Postbox.
//!
//! This crate contains the upload confirmation flow and the ports it talks
//! to, with no web framework dependencies.
//!
//! # Modules
//!
//! - `attachment` - Upload tickets, confirmation and attachment classification
//! - `storage` - Object storage port and its OpenDAL implementation
//! - `fetch` - Byte fetching over presigned URLs
//! - `thumbnail` - Thumbnail generation for image attachments

pub mod attachment;
pub mod fetch;
pub mod storage;
pub mod thumbnail;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;
