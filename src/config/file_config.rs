use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub data_dir: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub public_dir: Option<String>,
    /// Keep a local copy of every track under `{data_dir}/tracks`.
    pub keep_local_copy: Option<bool>,

    // Feature configs
    pub generator: Option<GeneratorConfig>,
    pub blob_store: Option<BlobStoreConfig>,
    pub matching: Option<MatchingConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct GeneratorConfig {
    pub url: Option<String>,
    pub model: Option<String>,
    /// Falls back to the `STABILITY_API_KEY` environment variable.
    pub api_key: Option<String>,
    pub timeout_sec: Option<u64>,
    pub generation_timeout_sec: Option<u64>,
    pub duration_secs: Option<u32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct BlobStoreConfig {
    /// When set, tracks are uploaded with `PUT {upload_url}/{key}`.
    pub upload_url: Option<String>,
    pub public_url: Option<String>,
    /// Falls back to the `BLOB_STORE_TOKEN` environment variable.
    pub token: Option<String>,
    pub timeout_sec: Option<u64>,

    /// When set (or `AWS_S3_BUCKET` is), tracks are uploaded to this S3 bucket.
    /// With neither an upload URL nor a bucket they are written to
    /// `{data_dir}/shared` and served by this server.
    pub s3_bucket: Option<String>,
    /// Falls back to `AWS_REGION`.
    pub s3_region: Option<String>,
    /// S3-compatible endpoint; uses path-style addressing.
    pub s3_endpoint: Option<String>,
    /// Falls back to `AWS_ACCESS_KEY_ID`.
    pub access_key_id: Option<String>,
    /// Falls back to `AWS_SECRET_ACCESS_KEY`.
    pub secret_access_key: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct MatchingConfig {
    pub tempo_tolerance: Option<u8>,
    pub style_tolerance: Option<u8>,
    pub energy_tolerance: Option<u8>,
    pub drums_tolerance: Option<u8>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
