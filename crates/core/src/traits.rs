//! Backend boundary traits
//!
//! `ObjectStore` is the object-storage protocol surface consumed by the
//! query and mutation operations; `UploadTransport` is the byte-transfer
//! surface consumed by the upload pipeline. Both are implemented by the
//! ov-s3 adapter and mocked for testing, keeping this crate free of any
//! SDK dependency.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// One raw object record from a listing page
#[derive(Debug, Clone)]
pub struct ObjectRecord {
    pub key: String,
    pub size_bytes: i64,
    pub last_modified: Option<jiff::Timestamp>,
    pub etag: Option<String>,
}

/// A single page of a prefix listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Content entries (files)
    pub objects: Vec<ObjectRecord>,

    /// Synthetic directory groupings (only when a delimiter was set)
    pub common_prefixes: Vec<String>,

    /// Token for the next page, absent on the last page
    pub next_continuation_token: Option<String>,
}

/// Parameters for one listing call
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub prefix: String,

    /// Delimiter for one-level grouping; `None` lists recursively
    pub delimiter: Option<String>,

    pub continuation_token: Option<String>,

    pub max_keys: Option<i32>,
}

/// Metadata returned by an existence probe
#[derive(Debug, Clone)]
pub struct ObjectStat {
    pub key: String,
    pub size_bytes: i64,
    pub last_modified: Option<jiff::Timestamp>,
    pub etag: Option<String>,
    pub content_type: Option<String>,
}

/// Progress callback: (bytes sent, total bytes)
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Object-storage protocol boundary
///
/// Implemented by the S3 adapter; mocked in unit tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one listing page for a prefix.
    async fn list_page(&self, request: ListRequest) -> Result<ListPage>;

    /// Probe a key. `Ok(None)` means the object does not exist; only
    /// transport or auth problems are errors.
    async fn head_object(&self, key: &str) -> Result<Option<ObjectStat>>;

    /// Server-side copy of a single object.
    async fn copy_object(&self, source_key: &str, destination_key: &str) -> Result<()>;

    /// Delete a single object.
    async fn delete_object(&self, key: &str) -> Result<()>;

    /// Write a zero-length object (directory marker).
    async fn put_empty_object(&self, key: &str) -> Result<()>;

    /// Generate a time-limited read URL.
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String>;

    /// Generate a time-limited write URL.
    async fn presign_put<'a>(
        &self,
        key: &str,
        content_type: Option<&'a str>,
        expires_in: Duration,
    ) -> Result<String>;
}

/// Byte-transfer boundary for uploads to a presigned URL
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Stream `body` to `url`, reporting progress as chunks are sent.
    /// A triggered `cancel` token surfaces as `Error::Cancelled`.
    async fn upload(
        &self,
        url: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> Result<()>;
}
