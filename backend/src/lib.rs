//! # Orderload - regional order consolidation into SQLite
//!
//! Orderload reads the order exports of several regions, cleans and
//! deduplicates them, and replaces a SQLite table with the result. A small
//! JokeAPI importer shares the same storage and HTTP plumbing.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV Files  │────▶│   Parser    │────▶│  Transform  │────▶│   SQLite    │
//! │ (per region)│     │  (auto-enc) │     │ (net, dedup)│     │  (replace)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                                    │
//!                                                             ┌─────────────┐
//!                                                             │ Validation  │
//!                                                             │  (queries)  │
//!                                                             └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use orderload::{run_etl, EtlOptions, SourceFile};
//!
//! let sources = [
//!     SourceFile::new("order_region_a(in).csv", "A"),
//!     SourceFile::new("order_region_b(in).csv", "B"),
//! ];
//! let outcome = run_etl(&sources, &EtlOptions::default()).unwrap();
//! println!("Loaded {} rows", outcome.loaded);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Raw and cleaned order rows, jokes, table names
//! - [`config`] - Environment settings
//! - [`parser`] - CSV reading with encoding and delimiter detection
//! - [`transform`] - Coercion, discount parsing, dedup and the pipeline
//! - [`storage`] - SQLite full-replace loader
//! - [`validation`] - Post-load check queries
//! - [`jokes`] - JokeAPI importer
//! - [`api`] - HTTP API server and log broadcaster

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Reading
pub mod parser;

// Transformation
pub mod transform;

// Loading
pub mod storage;

// Validation
pub mod validation;

// Jokes
pub mod jokes;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, JokeError, LoadError, PipelineError, PipelineResult, ReadError, ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{ImportCounts, Joke, RawOrderRow, TableName, TransformedOrderRow};

// =============================================================================
// Re-exports - Reader
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, read_orders,
    read_orders_with_metadata, ParseResult,
};

// =============================================================================
// Re-exports - Transformer
// =============================================================================

pub use transform::{
    parse_discount, run_etl, run_etl_bytes, transform_orders, DiscountValue, EtlOptions,
    EtlOutcome, SourceFile, TransformOutput, TransformStats,
};

// =============================================================================
// Re-exports - Loader and validation
// =============================================================================

pub use storage::{load_orders, open_database, DEFAULT_DATABASE};
pub use validation::{run_checks, validation_queries, ValidationQuery, ValidationReport};

// =============================================================================
// Re-exports - Jokes
// =============================================================================

pub use jokes::{import_jokes, HttpJokeSource, JokeSource};

pub use config::AppConfig;

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
