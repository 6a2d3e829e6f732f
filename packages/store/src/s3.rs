//! S3-compatible object store (AWS S3, Cloudflare R2, `MinIO`).

use std::time::Duration;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::{Credentials, StalledStreamProtectionConfig};
use aws_sdk_s3::operation::get_object::GetObjectError;

use crate::config::S3Config;
use crate::{ObjectStore, StorageError, with_timeout};

/// Object store backed by one S3 bucket.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    timeout: Duration,
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("bucket", &self.bucket)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl S3ObjectStore {
    /// Builds a client from static credentials.
    ///
    /// A custom endpoint (R2, `MinIO`) switches to path-style addressing.
    #[must_use]
    pub fn new(config: &S3Config, timeout: Duration) -> Self {
        let creds = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "nuisance-map-env",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .region(Region::new(config.region.clone()))
            .credentials_provider(creds)
            .stalled_stream_protection(StalledStreamProtectionConfig::disabled());

        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            timeout,
        }
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{key}", self.bucket)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let location = self.location(key);
        log::debug!("Pulling {location}");

        with_timeout("read", &location, self.timeout, async {
            let result = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await;

            let output = match result {
                Ok(output) => output,
                Err(err) => {
                    // NoSuchKey is not an error: the collection hasn't been created yet
                    if err
                        .as_service_error()
                        .is_some_and(GetObjectError::is_no_such_key)
                    {
                        return Ok(None);
                    }
                    return Err(StorageError::Read {
                        location: location.clone(),
                        source: Box::new(err),
                    });
                }
            };

            let bytes = output.body.collect().await.map_err(|e| StorageError::Read {
                location: location.clone(),
                source: Box::new(e),
            })?;

            let body = bytes.into_bytes().to_vec();
            log::debug!("  downloaded {} bytes", body.len());
            Ok(Some(body))
        })
        .await
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        let location = self.location(key);
        log::info!("Pushing {} bytes -> {location}", body.len());

        with_timeout("write", &location, self.timeout, async {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .body(aws_sdk_s3::primitives::ByteStream::from(body))
                .content_type("text/csv; charset=utf-8")
                .send()
                .await
                .map_err(|e| StorageError::Write {
                    location: location.clone(),
                    source: Box::new(e),
                })?;
            Ok(())
        })
        .await
    }
}
