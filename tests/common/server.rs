//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own songs database and
//! track directories, backed by a fake generator.

use super::constants::*;
use super::fakes::FakeGenerator;
use epa_dunk_server::audio_generator::AudioGenerator;
use epa_dunk_server::blob_store::{LocalBlobStore, LocalTrackSink};
use epa_dunk_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use epa_dunk_server::song_store::{HistoryStore, SqliteHistoryStore};
use epa_dunk_server::{GenerationSettings, SongGenerator};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated data directory
///
/// When dropped, the server shuts down and the data directory is removed.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    pub port: u16,

    /// History store for direct database access in tests
    pub history: Arc<dyn HistoryStore>,

    fake_generator: Option<Arc<FakeGenerator>>,

    _data_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port with a [`FakeGenerator`].
    pub async fn spawn() -> Self {
        let generator = Arc::new(FakeGenerator::default());
        Self::start(generator.clone(), Some(generator)).await
    }

    /// Spawns a server that generates audio with `audio_generator`.
    #[allow(dead_code)]
    pub async fn spawn_with_generator(audio_generator: Arc<dyn AudioGenerator>) -> Self {
        Self::start(audio_generator, None).await
    }

    /// The fake generator behind a server started with [`TestServer::spawn`].
    #[allow(dead_code)]
    pub fn generator(&self) -> &FakeGenerator {
        self.fake_generator
            .as_deref()
            .expect("Server was not started with a fake generator")
    }

    async fn start(
        audio_generator: Arc<dyn AudioGenerator>,
        fake_generator: Option<Arc<FakeGenerator>>,
    ) -> Self {
        let data_dir = TempDir::new().expect("Failed to create data dir");
        let tracks_dir = data_dir.path().join("tracks");
        let shared_dir = data_dir.path().join("shared");

        let history: Arc<dyn HistoryStore> = Arc::new(
            SqliteHistoryStore::new(data_dir.path().join("songs.db"))
                .expect("Failed to open songs store"),
        );

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let song_generator = SongGenerator::new(
            history.clone(),
            audio_generator,
            Arc::new(LocalBlobStore::new(
                &shared_dir,
                format!("{}/shared", base_url),
            )),
            Some(Arc::new(LocalTrackSink::new(&tracks_dir))),
            GenerationSettings::default(),
        );

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
            metrics_port: 0,
            public_dir: None,
            tracks_dir: Some(tracks_dir),
            shared_dir: Some(shared_dir),
        };
        let app = make_app(config, song_generator).expect("Failed to build app");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            history,
            fake_generator,
            _data_dir: data_dir,
            _shutdown_tx: Some(shutdown_tx),
        };
        server.wait_for_ready().await;
        server
    }

    /// Polls /api/health until the server answers
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client
                .get(format!("{}/api/health", self.base_url))
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
