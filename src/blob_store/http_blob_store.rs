//! Object storage reached through plain HTTP `PUT` requests.
//!
//! Works with any bucket or gateway that accepts `PUT {upload_base_url}/{key}`
//! and serves the object at `{public_base_url}/{key}`.

use super::{validate_key, BlobStore, StorageError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

pub struct HttpBlobStore {
    client: Client,
    upload_base_url: String,
    public_base_url: String,
    auth_token: Option<String>,
}

impl HttpBlobStore {
    pub fn new(
        upload_base_url: impl Into<String>,
        public_base_url: impl Into<String>,
        auth_token: Option<String>,
        timeout_sec: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            upload_base_url: upload_base_url.into().trim_end_matches('/').to_string(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    pub fn upload_url(&self, key: &str) -> String {
        format!("{}/{}", self.upload_base_url, key)
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(
        &self,
        bytes: &[u8],
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        validate_key(key)?;

        let mut request = self
            .client
            .put(self.upload_url(key))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec());
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                StorageError::Timeout
            } else {
                StorageError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(key, status = status.as_u16(), "Blob upload rejected");
            return Err(StorageError::Upload {
                status: status.as_u16(),
                message,
            });
        }

        debug!(key, bytes = bytes.len(), "Uploaded blob");
        Ok(self.public_url(key))
    }
}
