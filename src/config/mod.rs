mod file_config;

pub use file_config::{BlobStoreConfig, FileConfig, GeneratorConfig, MatchingConfig};

use crate::audio_generator::{DEFAULT_STABLE_AUDIO_MODEL, DEFAULT_STABLE_AUDIO_URL};
use crate::server::RequestsLoggingLevel;
use crate::song_store::Tolerances;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const STABILITY_API_KEY_ENV: &str = "STABILITY_API_KEY";
pub const BLOB_STORE_TOKEN_ENV: &str = "BLOB_STORE_TOKEN";
pub const AWS_S3_BUCKET_ENV: &str = "AWS_S3_BUCKET";
pub const AWS_REGION_ENV: &str = "AWS_REGION";
pub const AWS_ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";

const DEFAULT_S3_REGION: &str = "us-east-1";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub data_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub public_dir: Option<PathBuf>,
    pub generator_url: Option<String>,
    pub generator_timeout_sec: u64,
    pub blob_upload_url: Option<String>,
    pub blob_public_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Per-request HTTP timeout of the generator client.
    pub timeout_sec: u64,
    /// Upper bound on a whole generator call, including retries inside the client.
    pub generation_timeout_sec: u64,
    pub duration_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobStoreSettings {
    /// Upload with HTTP `PUT` to an external bucket or gateway.
    Http {
        upload_url: String,
        public_url: String,
        token: Option<String>,
        timeout_sec: u64,
    },
    /// Upload to an S3 bucket, or an S3-compatible service when `endpoint` is set.
    S3 {
        bucket: String,
        region: String,
        endpoint: Option<String>,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        public_url: Option<String>,
        timeout_sec: u64,
    },
    /// Write into `{data_dir}/shared` and serve it from this server.
    Local { public_url: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub data_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub public_dir: Option<PathBuf>,
    pub keep_local_copy: bool,

    // Feature configs (with defaults)
    pub generator: GeneratorSettings,
    pub blob_store: BlobStoreSettings,
    pub tolerances: Tolerances,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .or_else(|| cli.data_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("data_dir must be specified via --data-dir or in config file")
            })?;

        if !data_dir.exists() {
            bail!("Data directory does not exist: {:?}", data_dir);
        }
        if !data_dir.is_dir() {
            bail!("data_dir is not a directory: {:?}", data_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let public_dir = file
            .public_dir
            .map(PathBuf::from)
            .or_else(|| cli.public_dir.clone());
        let keep_local_copy = file.keep_local_copy.unwrap_or(true);

        let gen_file = file.generator.unwrap_or_default();
        let generator = GeneratorSettings {
            url: gen_file
                .url
                .or_else(|| cli.generator_url.clone())
                .unwrap_or_else(|| DEFAULT_STABLE_AUDIO_URL.to_string()),
            model: gen_file
                .model
                .unwrap_or_else(|| DEFAULT_STABLE_AUDIO_MODEL.to_string()),
            api_key: file_or_env(gen_file.api_key, STABILITY_API_KEY_ENV),
            timeout_sec: gen_file.timeout_sec.unwrap_or(cli.generator_timeout_sec),
            generation_timeout_sec: gen_file.generation_timeout_sec.unwrap_or(240),
            duration_secs: gen_file.duration_secs.unwrap_or(30),
        };

        let blob_file = file.blob_store.unwrap_or_default();
        let blob_public_url = blob_file
            .public_url
            .or_else(|| cli.blob_public_url.clone());
        let blob_timeout_sec = blob_file.timeout_sec.unwrap_or(60);
        let upload_url = blob_file.upload_url.or_else(|| cli.blob_upload_url.clone());
        let s3_bucket = file_or_env(blob_file.s3_bucket, AWS_S3_BUCKET_ENV);
        let blob_store = match (upload_url, s3_bucket) {
            (Some(upload_url), _) => BlobStoreSettings::Http {
                public_url: blob_public_url.unwrap_or_else(|| upload_url.clone()),
                upload_url,
                token: file_or_env(blob_file.token, BLOB_STORE_TOKEN_ENV),
                timeout_sec: blob_timeout_sec,
            },
            (None, Some(bucket)) => BlobStoreSettings::S3 {
                bucket,
                region: file_or_env(blob_file.s3_region, AWS_REGION_ENV)
                    .unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
                endpoint: blob_file.s3_endpoint,
                access_key_id: file_or_env(blob_file.access_key_id, AWS_ACCESS_KEY_ID_ENV),
                secret_access_key: file_or_env(
                    blob_file.secret_access_key,
                    AWS_SECRET_ACCESS_KEY_ENV,
                ),
                public_url: blob_public_url,
                timeout_sec: blob_timeout_sec,
            },
            (None, None) => BlobStoreSettings::Local {
                public_url: blob_public_url
                    .unwrap_or_else(|| format!("http://localhost:{}/shared", port)),
            },
        };

        let matching = file.matching.unwrap_or_default();
        let defaults = Tolerances::default();
        let tolerances = Tolerances {
            tempo: matching.tempo_tolerance.unwrap_or(defaults.tempo),
            style: matching.style_tolerance.unwrap_or(defaults.style),
            energy: matching.energy_tolerance.unwrap_or(defaults.energy),
            drums: matching.drums_tolerance.unwrap_or(defaults.drums),
        };

        Ok(AppConfig {
            data_dir,
            port,
            metrics_port,
            logging_level,
            public_dir,
            keep_local_copy,
            generator,
            blob_store,
            tolerances,
        })
    }

    pub fn songs_db_path(&self) -> PathBuf {
        self.data_dir.join("songs.db")
    }

    pub fn tracks_dir(&self) -> PathBuf {
        self.data_dir.join("tracks")
    }

    pub fn shared_dir(&self) -> PathBuf {
        self.data_dir.join("shared")
    }
}

/// A value from the config file, or else from the environment. Empty values count as unset.
fn file_or_env(file_value: Option<String>, env_var: &str) -> Option<String> {
    file_value
        .or_else(|| std::env::var(env_var).ok())
        .filter(|s| !s.trim().is_empty())
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
