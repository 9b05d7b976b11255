use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use epa_dunk_server::audio_generator::{GenerationOptions, StableAudioClient};
use epa_dunk_server::blob_store::{
    BlobStore, HttpBlobStore, LocalBlobStore, LocalTrackSink, S3BlobStore, TrackSink,
};
use epa_dunk_server::config::{self, BlobStoreSettings};
use epa_dunk_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};
use epa_dunk_server::song_store::{HistoryStore, SqliteHistoryStore};
use epa_dunk_server::{GenerationSettings, SongGenerator};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding songs.db, local track copies and the local blob store.
    /// Can also be specified in config file.
    #[clap(long, value_parser = parse_dir)]
    pub data_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3000)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the dashboard directory to be statically served.
    #[clap(long, value_parser = parse_dir)]
    pub public_dir: Option<PathBuf>,

    /// Base URL of the Stable Audio API.
    #[clap(long)]
    pub generator_url: Option<String>,

    /// Timeout in seconds for a single text-to-audio request.
    #[clap(long, default_value_t = 180)]
    pub generator_timeout_sec: u64,

    /// Upload tracks with HTTP PUT to this base URL instead of serving them locally.
    #[clap(long)]
    pub blob_upload_url: Option<String>,

    /// Base URL under which uploaded tracks are publicly reachable.
    #[clap(long)]
    pub blob_public_url: Option<String>,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            data_dir: args.data_dir.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            public_dir: args.public_dir.clone(),
            generator_url: args.generator_url.clone(),
            generator_timeout_sec: args.generator_timeout_sec,
            blob_upload_url: args.blob_upload_url.clone(),
            blob_public_url: args.blob_public_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  data_dir: {:?}", app_config.data_dir);
    info!("  port: {}", app_config.port);
    info!("  generator: {}", app_config.generator.url);

    if app_config.generator.api_key.is_none() {
        warn!(
            "No generator API key configured (set {} or generator.api_key)",
            config::STABILITY_API_KEY_ENV
        );
    }

    if !app_config.songs_db_path().exists() {
        info!(
            "Creating new songs database at {:?}",
            app_config.songs_db_path()
        );
    }
    let history: Arc<dyn HistoryStore> =
        Arc::new(SqliteHistoryStore::new(app_config.songs_db_path())?);

    info!("Initializing metrics...");
    metrics::init_metrics();
    metrics::set_songs_total(history.count()?);

    let generator = Arc::new(StableAudioClient::new(
        app_config.generator.url.clone(),
        app_config.generator.model.clone(),
        app_config.generator.api_key.clone(),
        app_config.generator.timeout_sec,
    )?);

    let (blob_store, shared_dir): (Arc<dyn BlobStore>, Option<PathBuf>) =
        match &app_config.blob_store {
            BlobStoreSettings::Http {
                upload_url,
                public_url,
                token,
                timeout_sec,
            } => {
                info!("Uploading tracks to {}", upload_url);
                let store = HttpBlobStore::new(
                    upload_url.clone(),
                    public_url.clone(),
                    token.clone(),
                    *timeout_sec,
                )?;
                (Arc::new(store), None)
            }
            BlobStoreSettings::S3 {
                bucket,
                region,
                endpoint,
                access_key_id,
                secret_access_key,
                public_url,
                timeout_sec,
            } => {
                info!("Uploading tracks to S3 bucket {} ({})", bucket, region);
                let store = S3BlobStore::new(
                    bucket,
                    region,
                    endpoint.as_deref(),
                    access_key_id.as_deref(),
                    secret_access_key.as_deref(),
                    public_url.as_deref(),
                    *timeout_sec,
                )?;
                (Arc::new(store), None)
            }
            BlobStoreSettings::Local { public_url } => {
                info!("Sharing tracks from {:?} as {}", app_config.shared_dir(), public_url);
                let store = LocalBlobStore::new(app_config.shared_dir(), public_url.clone());
                (Arc::new(store), Some(app_config.shared_dir()))
            }
        };

    let (track_sink, tracks_dir): (Option<Arc<dyn TrackSink>>, Option<PathBuf>) =
        if app_config.keep_local_copy {
            let sink = LocalTrackSink::new(app_config.tracks_dir());
            (Some(Arc::new(sink)), Some(app_config.tracks_dir()))
        } else {
            (None, None)
        };

    let settings = GenerationSettings {
        tolerances: app_config.tolerances,
        options: GenerationOptions {
            duration_secs: app_config.generator.duration_secs,
            ..Default::default()
        },
        generator_timeout: Duration::from_secs(app_config.generator.generation_timeout_sec),
    };
    let song_generator =
        SongGenerator::new(history, generator, blob_store, track_sink, settings);

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        metrics_port: app_config.metrics_port,
        public_dir: app_config.public_dir.clone(),
        tracks_dir,
        shared_dir,
    };

    tokio::select! {
        result = run_server(server_config, song_generator) => {
            info!("HTTP server stopped: {:?}", result);
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
