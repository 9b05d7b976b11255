use super::{validate_key, BlobStore, StorageError, TrackSink};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// URL prefix under which the server exposes the local track directory.
pub const TRACKS_URL_PREFIX: &str = "/tracks";

async fn write_file(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
    validate_key(file_name)?;
    fs::create_dir_all(dir).await?;

    let path = dir.join(file_name);
    let mut file = fs::File::create(&path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(path)
}

/// Keeps a copy of each track in a directory served under [`TRACKS_URL_PREFIX`].
pub struct LocalTrackSink {
    dir: PathBuf,
}

impl LocalTrackSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl TrackSink for LocalTrackSink {
    async fn save(&self, bytes: &[u8], file_name: &str) -> Result<String, StorageError> {
        let path = write_file(&self.dir, file_name, bytes).await?;
        debug!("Saved track to {:?}", path);
        Ok(format!("{}/{}", TRACKS_URL_PREFIX, file_name))
    }

    async fn remove(&self, file_name: &str) -> Result<(), StorageError> {
        validate_key(file_name)?;
        match fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// A blob store backed by a directory the server shares itself.
///
/// Objects are reachable at `{public_base_url}/{key}`; the server mounts the
/// directory so that URL resolves.
pub struct LocalBlobStore {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        bytes: &[u8],
        key: &str,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        write_file(&self.dir, key, bytes).await?;
        Ok(format!("{}/{}", self.public_base_url, key))
    }
}
