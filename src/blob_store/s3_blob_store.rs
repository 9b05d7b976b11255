//! Amazon S3 or any S3-compatible object storage, signed with SigV4.

use super::{validate_key, BlobStore, StorageError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use std::time::Duration;
use tracing::{debug, warn};

pub struct S3BlobStore {
    bucket: Box<Bucket>,
    public_base_url: String,
}

impl S3BlobStore {
    /// Creates a store for `bucket_name` in `region`.
    ///
    /// Without an `endpoint` the regional AWS endpoint is used with
    /// virtual-hosted addressing. A custom `endpoint` (MinIO, R2, a local
    /// stand-in) switches to path-style addressing.
    ///
    /// Missing keys are looked up the usual AWS way (environment, then
    /// profile). Objects are public at `public_base_url/{key}`, or at
    /// `https://{bucket}.s3.{region}.amazonaws.com/{key}` when unset.
    pub fn new(
        bucket_name: &str,
        region: &str,
        endpoint: Option<&str>,
        access_key_id: Option<&str>,
        secret_access_key: Option<&str>,
        public_base_url: Option<&str>,
        timeout_sec: u64,
    ) -> Result<Self> {
        let endpoint = endpoint.map(|e| e.trim_end_matches('/').to_string());
        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, None)
            .context("Failed to resolve S3 credentials")?;
        let s3_region = Region::Custom {
            region: region.to_string(),
            endpoint: endpoint
                .clone()
                .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", region)),
        };

        let mut bucket = Bucket::new(bucket_name, s3_region, credentials)
            .with_context(|| format!("Failed to configure S3 bucket {}", bucket_name))?;
        if endpoint.is_some() {
            bucket = bucket.with_path_style();
        }
        bucket.set_request_timeout(Some(Duration::from_secs(timeout_sec)));

        let public_base_url = match (public_base_url, &endpoint) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, Some(endpoint)) => format!("{}/{}", endpoint, bucket_name),
            (None, None) => format!("https://{}.s3.{}.amazonaws.com", bucket_name, region),
        };

        Ok(Self {
            bucket,
            public_base_url,
        })
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

fn map_s3_error(err: S3Error) -> StorageError {
    match err {
        S3Error::HttpFailWithBody(status, message) => StorageError::Upload { status, message },
        S3Error::Reqwest(e) if e.is_timeout() => StorageError::Timeout,
        other => StorageError::Connection(other.to_string()),
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        bytes: &[u8],
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        validate_key(key)?;

        let response = self
            .bucket
            .put_object_with_content_type(key, bytes, content_type)
            .await
            .map_err(|e| {
                let err = map_s3_error(e);
                warn!(key, "S3 upload failed: {}", err);
                err
            })?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            warn!(key, status, "S3 upload rejected");
            return Err(StorageError::Upload {
                status,
                message: String::from_utf8_lossy(response.as_slice()).into_owned(),
            });
        }

        debug!(key, bytes = bytes.len(), "Uploaded object to S3");
        Ok(self.public_url(key))
    }
}
