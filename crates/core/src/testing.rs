//! In-process fakes for the storage, fetch and thumbnail ports.
//!
//! Available to this crate's tests and, through the `test-util` feature,
//! to downstream crates' tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::fetch::{ByteFetcher, FetchError};
use crate::storage::{ObjectStore, PresignedUrl, StorageError, expiry_from_now};
use crate::thumbnail::{ThumbnailError, ThumbnailGenerator};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Object store holding a set of keys, recording every call.
#[derive(Debug, Default)]
pub struct FakeStore {
    objects: Mutex<HashSet<String>>,
    fail_exists: bool,
    fail_presign: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeStore {
    /// Bucket reported by the fake.
    pub const BUCKET: &'static str = "test-bucket";

    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that already holds `key`.
    #[must_use]
    pub fn with_object(self, key: &str) -> Self {
        lock(&self.objects).insert(key.to_string());
        self
    }

    /// Existence checks fail with an operation error.
    #[must_use]
    pub fn failing_exists(mut self) -> Self {
        self.fail_exists = true;
        self
    }

    /// Presigning fails.
    #[must_use]
    pub fn failing_presign(mut self) -> Self {
        self.fail_presign = true;
        self
    }

    /// URL the fake issues for a read of `key`.
    #[must_use]
    pub fn read_url(key: &str, ttl_secs: u64) -> String {
        format!("https://storage.test/{}/{key}?op=read&ttl={ttl_secs}", Self::BUCKET)
    }

    /// URL the fake issues for a write of `key`.
    #[must_use]
    pub fn write_url(key: &str, ttl_secs: u64) -> String {
        format!("https://storage.test/{}/{key}?op=write&ttl={ttl_secs}", Self::BUCKET)
    }

    /// Calls made so far, e.g. `"exists {key}"`, `"presign_read {key} {ttl}"`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Whether `key` has been stored.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        lock(&self.objects).contains(key)
    }

    fn record(&self, call: String) {
        lock(&self.calls).push(call);
    }

    fn presigned(&self, url: String, method: &str, ttl: Duration) -> PresignedUrl {
        PresignedUrl {
            url,
            method: method.to_string(),
            expires_at: expiry_from_now(ttl),
            headers: HashMap::new(),
        }
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    fn bucket(&self) -> &str {
        Self::BUCKET
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.record(format!("exists {key}"));
        if self.fail_exists {
            return Err(StorageError::operation("connection reset"));
        }
        Ok(self.contains(key))
    }

    async fn presign_read(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError> {
        self.record(format!("presign_read {key} {}", ttl.as_secs()));
        if self.fail_presign {
            return Err(StorageError::PresignNotSupported);
        }
        Ok(self.presigned(Self::read_url(key, ttl.as_secs()), "GET", ttl))
    }

    async fn presign_write(
        &self,
        key: &str,
        ttl: Duration,
        content_type: &str,
    ) -> Result<PresignedUrl, StorageError> {
        self.record(format!("presign_write {key} {}", ttl.as_secs()));
        if self.fail_presign {
            return Err(StorageError::PresignNotSupported);
        }
        let mut url = self.presigned(Self::write_url(key, ttl.as_secs()), "PUT", ttl);
        url.headers
            .insert("Content-Type".to_string(), content_type.to_string());
        Ok(url)
    }

    async fn write(
        &self,
        key: &str,
        _content: Bytes,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        self.record(format!("write {key}"));
        lock(&self.objects).insert(key.to_string());
        Ok(())
    }
}

/// Fetcher returning fixed content, or failing.
#[derive(Debug)]
pub struct FakeFetcher {
    content: Option<Bytes>,
    requested: Mutex<Vec<String>>,
}

impl FakeFetcher {
    /// Every fetch returns `content`.
    #[must_use]
    pub fn returning(content: &'static [u8]) -> Self {
        Self {
            content: Some(Bytes::from_static(content)),
            requested: Mutex::default(),
        }
    }

    /// Every fetch fails with a 403.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            content: None,
            requested: Mutex::default(),
        }
    }

    /// URLs fetched so far.
    #[must_use]
    pub fn requested_urls(&self) -> Vec<String> {
        lock(&self.requested).clone()
    }
}

#[async_trait]
impl ByteFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        lock(&self.requested).push(url.to_string());
        self.content.clone().ok_or(FetchError::Status(403))
    }
}

/// What a [`FakeThumbnailer`] answers.
#[derive(Debug, Clone)]
pub enum ThumbnailOutcome {
    /// Succeed with this URL.
    Url(String),
    /// Succeed without a URL.
    NoUrl,
    /// Fail with a decode error.
    Fail,
}

/// One recorded generator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailCall {
    /// Bucket passed in.
    pub bucket: String,
    /// Key passed in.
    pub key: String,
    /// Content passed in.
    pub content: Vec<u8>,
}

/// Thumbnail generator with a scripted outcome.
#[derive(Debug)]
pub struct FakeThumbnailer {
    outcome: ThumbnailOutcome,
    calls: Mutex<Vec<ThumbnailCall>>,
}

impl FakeThumbnailer {
    /// Generator that always answers `outcome`.
    #[must_use]
    pub fn new(outcome: ThumbnailOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::default(),
        }
    }

    /// Calls made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ThumbnailCall> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl ThumbnailGenerator for FakeThumbnailer {
    async fn generate(
        &self,
        bucket: &str,
        key: &str,
        content: Bytes,
    ) -> Result<Option<String>, ThumbnailError> {
        lock(&self.calls).push(ThumbnailCall {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content: content.to_vec(),
        });

        match &self.outcome {
            ThumbnailOutcome::Url(url) => Ok(Some(url.clone())),
            ThumbnailOutcome::NoUrl => Ok(None),
            ThumbnailOutcome::Fail => Err(ThumbnailError::Decode("unsupported color type".into())),
        }
    }
}
