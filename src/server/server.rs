use anyhow::{Context, Result};
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::{debug, error, info};

use super::{log_requests, metrics, state::*, ServerConfig};
use crate::blob_store::TRACKS_URL_PREFIX;
use crate::generation::{GenerateSongError, SongGenerator};
use crate::mood::RawMoodPayload;

/// Requests larger than this are rejected before reaching the handlers.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// URL prefix of the local blob store directory.
pub const SHARED_URL_PREFIX: &str = "/shared";

#[derive(Serialize)]
struct HealthStats {
    pub uptime: String,
    pub songs: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateSongResponse {
    pub success: bool,
    pub audio_url: String,
    pub public_url: String,
}

#[derive(Serialize)]
struct ErrorBody {
    pub success: bool,
    pub error: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

fn error_response(status: StatusCode, error: String) -> Response {
    (
        status,
        Json(ErrorBody {
            success: false,
            error,
        }),
    )
        .into_response()
}

async fn home() -> impl IntoResponse {
    "EPA-dunk mood server"
}

async fn get_health(
    State(state): State<ServerState>,
    State(history): State<GuardedHistoryStore>,
) -> Response {
    match history.count() {
        Ok(songs) => {
            metrics::set_songs_total(songs);
            Json(HealthStats {
                uptime: format_uptime(state.start_time.elapsed()),
                songs,
            })
            .into_response()
        }
        Err(err) => {
            error!("Failed to count songs: {:#}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

async fn generate_song(
    State(song_generator): State<GuardedSongGenerator>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            debug!("Rejected song request: {}", rejection.body_text());
            return error_response(rejection.status(), rejection.body_text());
        }
    };
    let payload = RawMoodPayload::from_body(body);
    match song_generator.generate(&payload).await {
        Ok(song) => Json(GenerateSongResponse {
            success: true,
            audio_url: song.audio_url,
            public_url: song.public_url,
        })
        .into_response(),
        Err(err) => {
            error!("Song generation failed: {}", err);
            let status = match &err {
                GenerateSongError::Generation(_) => StatusCode::BAD_GATEWAY,
                GenerateSongError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error_response(status, err.to_string())
        }
    }
}

pub fn make_app(config: ServerConfig, song_generator: SongGenerator) -> Result<Router> {
    let state = ServerState::new(config.clone(), song_generator);

    let api_routes: Router = Router::new()
        .route("/generate-song", post(generate_song))
        .route("/health", get(get_health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state.clone());

    let home_router: Router = match &config.public_dir {
        Some(public_dir) => {
            let static_files_service =
                ServeDir::new(public_dir).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new().route("/", get(home)),
    };

    let mut app: Router = home_router.nest("/api", api_routes);

    if let Some(tracks_dir) = &config.tracks_dir {
        app = app.nest_service(TRACKS_URL_PREFIX, ServeDir::new(tracks_dir));
    }
    if let Some(shared_dir) = &config.shared_dir {
        app = app.nest_service(SHARED_URL_PREFIX, ServeDir::new(shared_dir));
    }

    app = app
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .layer(CorsLayer::permissive());

    Ok(app)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics::metrics_handler))
}

pub async fn run_server(config: ServerConfig, song_generator: SongGenerator) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, song_generator)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    tokio::try_join!(
        async { axum::serve(listener, app).await.context("HTTP server failed") },
        async {
            axum::serve(metrics_listener, make_metrics_app())
                .await
                .context("Metrics server failed")
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_generator::{AudioGenerator, GenerationOptions, GeneratorError};
    use crate::blob_store::{BlobStore, LocalBlobStore, LocalTrackSink, StorageError};
    use crate::generation::GenerationSettings;
    use crate::song_store::{HistoryStore, InMemoryHistoryStore};
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt; // for `oneshot`

    struct StaticGenerator {
        result: fn() -> Result<Vec<u8>, GeneratorError>,
    }

    #[async_trait]
    impl AudioGenerator for StaticGenerator {
        fn name(&self) -> &str {
            "static"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<Vec<u8>, GeneratorError> {
            (self.result)()
        }
    }

    struct RejectingBlobStore;

    #[async_trait]
    impl BlobStore for RejectingBlobStore {
        async fn put(&self, _: &[u8], _: &str, _: &str) -> Result<String, StorageError> {
            Err(StorageError::Upload {
                status: 403,
                message: "AccessDenied".to_string(),
            })
        }
    }

    struct TestApp {
        app: Router,
        history: Arc<InMemoryHistoryStore>,
        _dir: TempDir,
    }

    fn test_app(
        generator: fn() -> Result<Vec<u8>, GeneratorError>,
        blob_store: Option<Arc<dyn BlobStore>>,
    ) -> TestApp {
        let dir = TempDir::new().unwrap();
        let tracks_dir = dir.path().join("tracks");
        let shared_dir = dir.path().join("shared");
        let history = Arc::new(InMemoryHistoryStore::default());
        let blob_store = blob_store.unwrap_or_else(|| {
            Arc::new(LocalBlobStore::new(&shared_dir, "http://localhost/shared"))
        });
        let song_generator = SongGenerator::new(
            history.clone(),
            Arc::new(StaticGenerator { result: generator }),
            blob_store,
            Some(Arc::new(LocalTrackSink::new(&tracks_dir))),
            GenerationSettings::default(),
        );
        let config = ServerConfig {
            requests_logging_level: crate::server::RequestsLoggingLevel::None,
            tracks_dir: Some(tracks_dir),
            shared_dir: Some(shared_dir),
            ..Default::default()
        };
        TestApp {
            app: make_app(config, song_generator).unwrap(),
            history,
            _dir: dir,
        }
    }

    fn audio() -> Result<Vec<u8>, GeneratorError> {
        Ok(b"ID3-audio".to_vec())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn formats_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }

    #[tokio::test]
    async fn generate_song_returns_urls() {
        let test = test_app(audio, None);

        let response = test
            .app
            .clone()
            .oneshot(post_json(
                "/api/generate-song",
                json!({"payload": {"tempo": 40, "typ_value": 70, "energi_value": 80,
                    "trummor_value": 90, "bassPlus": true, "dist": false}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        let audio_url = body["audioUrl"].as_str().unwrap();
        assert!(audio_url.starts_with("/tracks/epa_"));
        assert!(body["publicUrl"]
            .as_str()
            .unwrap()
            .starts_with("http://localhost/shared/epa_"));
        assert_eq!(test.history.count().unwrap(), 1);

        // The local copy is served back.
        let response = test
            .app
            .oneshot(Request::get(audio_url).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn generator_failure_maps_to_bad_gateway() {
        let test = test_app(|| Err(GeneratorError::RateLimited), None);

        let response = test
            .app
            .oneshot(post_json("/api/generate-song", json!({"tempo": 10})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Rate limited"));
        assert_eq!(test.history.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn storage_failure_maps_to_internal_error() {
        let test = test_app(audio, Some(Arc::new(RejectingBlobStore)));

        let response = test
            .app
            .oneshot(post_json("/api/generate-song", json!({"tempo": 10})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("AccessDenied"));
        assert_eq!(test.history.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let test = test_app(audio, None);

        let request = Request::builder()
            .method("POST")
            .uri("/api/generate-song")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = test.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(!body["error"].as_str().unwrap().is_empty());
        assert_eq!(test.history.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_content_type_gets_json_error() {
        let test = test_app(audio, None);

        let request = Request::builder()
            .method("POST")
            .uri("/api/generate-song")
            .body(Body::from(r#"{"tempo": 50}"#))
            .unwrap();
        let response = test.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Content-Type"));
        assert_eq!(test.history.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn oversized_body_gets_json_error() {
        let test = test_app(audio, None);

        let padding = "x".repeat(MAX_BODY_BYTES + 1);
        let response = test
            .app
            .oneshot(post_json(
                "/api/generate-song",
                json!({"tempo": 50, "padding": padding}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(test.history.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn health_reports_song_count() {
        let test = test_app(audio, None);
        test.app
            .clone()
            .oneshot(post_json("/api/generate-song", json!({})))
            .await
            .unwrap();

        let response = test
            .app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["songs"], 1);
        assert!(body["uptime"].as_str().unwrap().starts_with("0d "));
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let test = test_app(audio, None);

        let request = Request::get("/api/health")
            .header("origin", "https://dashboard.example")
            .body(Body::empty())
            .unwrap();
        let response = test.app.oneshot(request).await.unwrap();

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
    }
}
