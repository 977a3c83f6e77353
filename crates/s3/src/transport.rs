//! Upload transport over presigned URLs
//!
//! Streams a file body to a presigned PUT URL with chunked progress
//! reporting and cooperative cancellation. This is the only HTTP client in
//! the workspace; everything else goes through the SDK.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;

use ov_core::{Error, ProgressFn, Result, UploadTransport};

/// Chunk size for progress granularity
const CHUNK_SIZE: usize = 64 * 1024;

/// HTTP transport for uploads to presigned URLs
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn upload(
        &self,
        url: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let total = body.len() as u64;
        let sent = Arc::new(AtomicU64::new(0));

        let chunks: Vec<bytes::Bytes> = body
            .chunks(CHUNK_SIZE.max(1))
            .map(bytes::Bytes::copy_from_slice)
            .collect();

        let counter = sent.clone();
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            let done = counter.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
            progress(done, total);
            Ok::<bytes::Bytes, std::io::Error>(chunk)
        });

        let mut request = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(stream));

        if let Some(ct) = content_type {
            request = request.header(CONTENT_TYPE, ct);
        }

        let response = tokio::select! {
            () = cancel.cancelled() => return Err(Error::Cancelled),
            response = request.send() => {
                response.map_err(|e| Error::Network(format!("Upload transfer failed: {e}")))?
            }
        };

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == reqwest::StatusCode::FORBIDDEN {
            Err(Error::Auth(format!(
                "Upload rejected with status {status}; the signed URL may have expired"
            )))
        } else {
            Err(Error::Network(format!("Upload failed with status {status}")))
        }
    }
}
