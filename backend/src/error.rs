//! Error types for the order consolidation pipeline and the joke importer.
//!
//! - [`ReadError`] - reading regional CSV exports
//! - [`LoadError`] - writing to and querying SQLite
//! - [`ConfigError`] - invalid settings (table names, env values)
//! - [`JokeError`] - JokeAPI fetches and joke upserts
//! - [`PipelineError`] - top-level ETL orchestration errors
//! - [`ServerError`] - HTTP surface
//!
//! Conversions are `From` based so `?` works across layers.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Reader Errors
// =============================================================================

/// Errors while reading a regional order export.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The source file does not exist.
    #[error("Missing source file: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("Cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No header line.
    #[error("CSV input is empty")]
    EmptyFile,

    /// Structurally broken CSV record.
    #[error("Invalid CSV at line {line}: {message}")]
    Parse { line: u64, message: String },
}

// =============================================================================
// Loader Errors
// =============================================================================

/// Errors while persisting or querying the destination database.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Destination directory could not be created.
    #[error("Cannot create directory '{}': {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// SQLite failure.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Table names are interpolated into SQL, so only plain identifiers pass.
    #[error("Invalid table name '{0}': expected letters, digits and underscores, not starting with a digit")]
    InvalidTableName(String),

    /// An environment variable holds a value of the wrong shape.
    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: String, value: String },
}

// =============================================================================
// Joke Import Errors
// =============================================================================

/// Errors from the joke importer.
#[derive(Debug, Error)]
pub enum JokeError {
    /// Requested fewer than one joke.
    #[error("Target must be at least 1")]
    InvalidTarget(i64),

    /// Transport failure or non-success HTTP status from JokeAPI.
    #[error("Failed to fetch jokes from JokeAPI: {0}")]
    Upstream(String),

    /// JokeAPI answered with `"error": true`.
    #[error("JokeAPI returned an error response: {0}")]
    UpstreamReported(String),

    /// The upstream body was not the JSON shape we expect.
    #[error("Invalid JokeAPI payload: {0}")]
    InvalidPayload(String),

    /// Destination directory or database failure.
    #[error("Joke storage error: {0}")]
    Storage(#[from] LoadError),

    /// The blocking storage task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<rusqlite::Error> for JokeError {
    fn from(err: rusqlite::Error) -> Self {
        JokeError::Storage(LoadError::Sqlite(err))
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level ETL errors returned by [`crate::transform::pipeline::run_etl`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reader failure.
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// Loader failure.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Invalid configuration.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Called without any source.
    #[error("No source files given")]
    NoSources,
}

impl From<rusqlite::Error> for PipelineError {
    fn from(err: rusqlite::Error) -> Self {
        PipelineError::Load(LoadError::Sqlite(err))
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// ETL failure.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Joke import failure.
    #[error("{0}")]
    Joke(#[from] JokeError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for reader operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// Result type for loader operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for joke import operations.
pub type JokeResult<T> = Result<T, JokeError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let read_err = ReadError::NotFound(PathBuf::from("data/region_a.csv"));
        let pipeline_err: PipelineError = read_err.into();
        assert!(pipeline_err.to_string().contains("data/region_a.csv"));

        let config_err = ConfigError::InvalidTableName("1orders".into());
        let pipeline_err: PipelineError = config_err.into();
        assert!(pipeline_err.to_string().contains("1orders"));
    }

    #[test]
    fn test_missing_file_message_names_path() {
        let err = ReadError::NotFound(PathBuf::from("/tmp/nope.csv"));
        assert_eq!(err.to_string(), "Missing source file: /tmp/nope.csv");
    }

    #[test]
    fn test_invalid_target_message() {
        let err = JokeError::InvalidTarget(0);
        assert_eq!(err.to_string(), "Target must be at least 1");

        let server_err: ServerError = err.into();
        assert_eq!(server_err.to_string(), "Target must be at least 1");
    }
}
