//! HTTP server.
//!
//! # API Endpoints
//!
//! | Method | Path                  | Description                              |
//! |--------|-----------------------|------------------------------------------|
//! | GET    | `/health`             | Health check                             |
//! | POST   | `/jokes/import`       | Import `?target=N` jokes from JokeAPI    |
//! | POST   | `/api/orders/upload`  | Multipart regional exports, run the ETL  |
//! | GET    | `/api/logs`           | SSE stream for real-time logs            |

use axum::{
    extract::{Multipart, Query, State},
    http::{header, Method},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{EtlResponse, ImportParams};
use crate::config::AppConfig;
use crate::error::{ServerError, ServerResult};
use crate::jokes::{import_jokes, HttpJokeSource, DEFAULT_TARGET_JOKES};
use crate::models::ImportCounts;
use crate::storage::open_database;
use crate::transform::pipeline::{run_etl_bytes, EtlOptions};
use crate::validation::run_checks;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jokes: HttpJokeSource,
}

impl AppState {
    pub fn new(config: AppConfig) -> ServerResult<Self> {
        let jokes = HttpJokeSource::new(config.joke_api_base_url.clone())?;
        Ok(Self {
            config: Arc::new(config),
            jokes,
        })
    }
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/jokes/import", post(import_jokes_handler))
        .route("/api/orders/upload", post(upload_orders))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.port;
    let state = AppState::new(config)?;
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Orderload server running on http://localhost:{}", port);
    println!("   POST /jokes/import       - Import jokes from JokeAPI");
    println!("   POST /api/orders/upload  - Upload regional CSV exports");
    println!("   GET  /api/logs           - SSE log stream");
    println!("   GET  /health             - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "orderload",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "jokes": "POST /jokes/import?target=N",
            "upload": "POST /api/orders/upload",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// Joke import endpoint
async fn import_jokes_handler(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
) -> ServerResult<Json<ImportCounts>> {
    let target = params.target.unwrap_or(i64::from(DEFAULT_TARGET_JOKES));
    let database_path = state.config.jokes_database_path.clone();

    let counts = import_jokes(&state.jokes, target, database_path)
        .await
        .map_err(|e| {
            log_error(format!("Joke import failed: {}", e));
            ServerError::from(e)
        })?;

    Ok(Json(counts))
}

/// Regional export upload endpoint.
///
/// Each file field is one region; the field name is the region label.
async fn upload_orders(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Json<EtlResponse>> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let region = field.name().unwrap_or("").trim().to_string();
        if region.is_empty() {
            continue;
        }
        let name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| region.clone());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;

        uploads.push((name, region, bytes.to_vec()));
    }

    if uploads.is_empty() {
        return Err(ServerError::BadRequest("No file provided".to_string()));
    }

    log_info(format!("📄 Upload with {} region file(s)", uploads.len()));

    let options = EtlOptions {
        database_path: state.config.database_path.clone(),
        table: state.config.table.clone(),
    };

    let response = tokio::task::spawn_blocking(move || -> ServerResult<EtlResponse> {
        let outcome = run_etl_bytes(&uploads, &options)?;
        let conn = open_database(&options.database_path)
            .map_err(|e| ServerError::Pipeline(e.into()))?;
        let report = run_checks(&conn, &options.table)
            .map_err(|e| ServerError::Pipeline(e.into()))?;
        Ok(EtlResponse::new(outcome, report))
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))?
    .map_err(|e| {
        log_error(format!("Upload failed: {}", e));
        e
    })?;

    Ok(Json(response))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn state(dir: &std::path::Path) -> AppState {
        let config = AppConfig {
            database_path: dir.join("sales.db"),
            jokes_database_path: dir.join("jokes.db"),
            // Never contacted by these tests
            joke_api_base_url: "http://127.0.0.1:9/joke".to_string(),
            ..AppConfig::default()
        };
        AppState::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_health_lists_endpoints() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
        assert!(body["endpoints"]["jokes"].as_str().unwrap().contains("/jokes/import"));
    }

    #[tokio::test]
    async fn test_import_rejects_zero_target() {
        let dir = tempfile::tempdir().unwrap();
        let result = import_jokes_handler(
            State(state(dir.path())),
            Query(ImportParams { target: Some(0) }),
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Target must be at least 1");
        assert!(!dir.path().join("jokes.db").exists());
    }
}
