//! Durable storage for generated audio.
//!
//! A [`BlobStore`] holds the shareable copy of every track and hands out its
//! public URL. A [`TrackSink`] optionally keeps a local copy that the server
//! itself serves to the dashboard.

mod http_blob_store;
mod local;
mod s3_blob_store;

pub use http_blob_store::HttpBlobStore;
pub use local::{LocalBlobStore, LocalTrackSink, TRACKS_URL_PREFIX};
pub use s3_blob_store::S3BlobStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while persisting a track or its record.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload failed (status {status}): {message}")]
    Upload { status: u16, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Upload timeout")]
    Timeout,

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("History store error: {0}")]
    History(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `key` and returns the public URL of the object.
    async fn put(&self, bytes: &[u8], key: &str, content_type: &str)
        -> Result<String, StorageError>;
}

#[async_trait]
pub trait TrackSink: Send + Sync {
    /// Writes a track and returns the URL the server serves it under.
    async fn save(&self, bytes: &[u8], file_name: &str) -> Result<String, StorageError>;

    /// Removes a previously saved track. Missing files are not an error.
    async fn remove(&self, file_name: &str) -> Result<(), StorageError>;
}

/// Keys end up in URLs and file paths, so only plain file names are accepted.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key != "."
        && key != ".."
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_file_names() {
        assert!(validate_key("epa_1700000000000_abcd1234.mp3").is_ok());
    }

    #[test]
    fn rejects_paths_and_empty_keys() {
        assert!(validate_key("").is_err());
        assert!(validate_key("..").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a/b.mp3").is_err());
        assert!(validate_key("a b.mp3").is_err());
    }
}
