//! REST API types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::error::{JokeError, PipelineError, ReadError, ServerError};
use crate::models::TableName;
use crate::transform::orders::TransformStats;
use crate::transform::pipeline::{EtlOutcome, SourceInfo};
use crate::validation::{validation_queries, ValidationQuery, ValidationReport};

/// Query string of `POST /jokes/import`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportParams {
    /// Number of jokes to request; defaults to 100.
    pub target: Option<i64>,
}

/// Response of `POST /api/orders/upload`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EtlResponse {
    /// Run identifier
    pub job_id: String,

    /// "ready" when the post-load checks are clean, "warning" otherwise
    pub status: String,

    pub loaded: usize,
    pub database_path: PathBuf,
    pub table: TableName,
    pub sources: Vec<SourceInfo>,
    pub stats: TransformStats,
    pub validation: ValidationReport,
    pub queries: Vec<ValidationQuery>,
    pub started_at: String,
    pub finished_at: String,
}

impl EtlResponse {
    pub fn new(outcome: EtlOutcome, validation: ValidationReport) -> Self {
        let status = if validation.is_clean() { "ready" } else { "warning" };
        let queries = validation_queries(&outcome.table);

        Self {
            job_id: outcome.run_id,
            status: status.to_string(),
            loaded: outcome.loaded,
            database_path: outcome.database_path,
            table: outcome.table,
            sources: outcome.sources,
            stats: outcome.stats,
            validation,
            queries,
            started_at: outcome.started_at,
            finished_at: outcome.finished_at,
        }
    }
}

/// Create an error response body
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
        "detail": error,
    })
}

impl ServerError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Joke(err) => match err {
                JokeError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
                JokeError::Upstream(_)
                | JokeError::UpstreamReported(_)
                | JokeError::InvalidPayload(_) => StatusCode::BAD_GATEWAY,
                JokeError::Storage(_) | JokeError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::Pipeline(err) => match err {
                PipelineError::NoSources => StatusCode::BAD_REQUEST,
                PipelineError::Read(ReadError::Io { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
                PipelineError::Read(_) => StatusCode::BAD_REQUEST,
                PipelineError::Load(_) | PipelineError::Config(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServerError::Joke(JokeError::InvalidTarget(0)), StatusCode::BAD_REQUEST),
            (ServerError::Joke(JokeError::Upstream("timeout".into())), StatusCode::BAD_GATEWAY),
            (
                ServerError::Joke(JokeError::UpstreamReported("No matching joke found".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ServerError::Pipeline(PipelineError::Read(ReadError::EmptyFile)),
                StatusCode::BAD_REQUEST,
            ),
            (ServerError::Pipeline(PipelineError::NoSources), StatusCode::BAD_REQUEST),
            (
                ServerError::Pipeline(PipelineError::Load(LoadError::Sqlite(
                    rusqlite::Error::InvalidQuery,
                ))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected, "{}", err);
        }
    }

    #[test]
    fn test_error_response_body() {
        let body = error_response("Target must be at least 1");
        assert_eq!(body["status"], "error");
        assert_eq!(body["detail"], "Target must be at least 1");
    }

    #[test]
    fn test_into_response_status() {
        let response = ServerError::BadRequest("no files".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
