//! S3 store implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from ov-core for
//! one configured bucket, including presigned GET/PUT URL generation.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::presigning::PresigningConfig;

use ov_core::{
    Config, Error, ListPage, ListRequest, ObjectRecord, ObjectStat, ObjectStore, Result,
};

/// S3-backed object store for a single bucket
pub struct S3Store {
    inner: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    /// Create a new store from the connection configuration.
    pub async fn connect(config: &Config) -> Result<Self> {
        config.validate()?;

        let credentials = aws_credential_types::Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None, // session token
            None, // expiry
            "objview-static-credentials",
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        tracing::debug!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = config.endpoint.as_deref().unwrap_or("default"),
            "s3 client configured"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn presign_config(expires_in: Duration) -> Result<PresigningConfig> {
        PresigningConfig::expires_in(expires_in)
            .map_err(|e| Error::General(format!("Invalid presign expiry: {e}")))
    }
}

/// Not-found detection for the existence probe.
///
/// The typed service error is authoritative; the display-string check is a
/// fallback for errors that reach us without a modeled variant. Callers of
/// `head_object` rely on not-found mapping to `Ok(None)`, never to `Err`.
fn head_not_found(service_error: Option<&HeadObjectError>, err_str: &str) -> bool {
    service_error.is_some_and(HeadObjectError::is_not_found)
        || err_str.contains("NotFound")
        || err_str.contains("NoSuchKey")
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_page(&self, request: ListRequest) -> Result<ListPage> {
        let mut call = self
            .inner
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&request.prefix);

        if let Some(delimiter) = &request.delimiter {
            call = call.delimiter(delimiter);
        }
        if let Some(token) = &request.continuation_token {
            call = call.continuation_token(token);
        }
        if let Some(max) = request.max_keys {
            call = call.max_keys(max);
        }

        let response = call
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let common_prefixes = response
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(|s| s.to_string()))
            .collect();

        let objects = response
            .contents()
            .iter()
            .map(|object| ObjectRecord {
                key: object.key().unwrap_or_default().to_string(),
                size_bytes: object.size().unwrap_or(0),
                last_modified: object
                    .last_modified()
                    .and_then(|m| jiff::Timestamp::from_second(m.secs()).ok()),
                etag: object.e_tag().map(|e| e.trim_matches('"').to_string()),
            })
            .collect();

        Ok(ListPage {
            objects,
            common_prefixes,
            next_continuation_token: response.next_continuation_token().map(|s| s.to_string()),
        })
    }

    async fn head_object(&self, key: &str) -> Result<Option<ObjectStat>> {
        let response = self
            .inner
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match response {
            Ok(head) => Ok(Some(ObjectStat {
                key: key.to_string(),
                size_bytes: head.content_length().unwrap_or(0),
                last_modified: head
                    .last_modified()
                    .and_then(|m| jiff::Timestamp::from_second(m.secs()).ok()),
                etag: head.e_tag().map(|e| e.trim_matches('"').to_string()),
                content_type: head.content_type().map(|ct| ct.to_string()),
            })),
            Err(e) => {
                let err_str = e.to_string();
                if head_not_found(e.as_service_error(), &err_str) {
                    Ok(None)
                } else if err_str.contains("AccessDenied") {
                    Err(Error::Auth(err_str))
                } else {
                    Err(Error::Network(err_str))
                }
            }
        }
    }

    async fn copy_object(&self, source_key: &str, destination_key: &str) -> Result<()> {
        let copy_source = format!("{}/{}", self.bucket, source_key);

        self.inner
            .copy_object()
            .copy_source(&copy_source)
            .bucket(&self.bucket)
            .key(destination_key)
            .send()
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                if err_str.contains("NotFound") || err_str.contains("NoSuchKey") {
                    Error::NotFound(source_key.to_string())
                } else {
                    Error::Network(err_str)
                }
            })?;

        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                if err_str.contains("NotFound") || err_str.contains("NoSuchKey") {
                    Error::NotFound(key.to_string())
                } else {
                    Error::Network(err_str)
                }
            })?;

        Ok(())
    }

    async fn put_empty_object(&self, key: &str) -> Result<()> {
        self.inner
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(aws_sdk_s3::primitives::ByteStream::from_static(&[]))
            .content_length(0)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String> {
        let presigned = self
            .inner
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(Self::presign_config(expires_in)?)
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    async fn presign_put<'a>(
        &self,
        key: &str,
        content_type: Option<&'a str>,
        expires_in: Duration,
    ) -> Result<String> {
        let mut call = self.inner.put_object().bucket(&self.bucket).key(key);

        if let Some(ct) = content_type {
            call = call.content_type(ct);
        }

        let presigned = call
            .presigned(Self::presign_config(expires_in)?)
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }
}
