//! End-to-end ETL: read every regional export, clean the combined rows, and
//! replace the destination table.
//!
//! # Example
//!
//! ```rust,ignore
//! use orderload::{run_etl, EtlOptions, SourceFile};
//!
//! let outcome = run_etl(
//!     &[SourceFile::new("order_region_a(in).csv", "A"), SourceFile::new("order_region_b(in).csv", "B")],
//!     &EtlOptions::default(),
//! )?;
//! println!("Loaded {} rows", outcome.loaded);
//! ```

use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::orders::{transform_orders, TransformStats};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult, ReadError};
use crate::models::{TableName, TransformedOrderRow};
use crate::parser::{parse_bytes_auto, read_orders_with_metadata, ParseResult};
use crate::storage::{load_orders, DEFAULT_DATABASE};

/// A regional export on disk and the label its rows get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub region: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, region: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            region: region.into(),
        }
    }
}

/// Where the cleaned rows go.
#[derive(Debug, Clone)]
pub struct EtlOptions {
    pub database_path: PathBuf,
    pub table: TableName,
}

impl Default for EtlOptions {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE),
            table: TableName::default(),
        }
    }
}

/// What was read from one source.
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub name: String,
    pub region: String,
    pub encoding: String,
    pub delimiter: char,
    pub row_count: usize,
}

/// Result of one ETL run.
#[derive(Debug, Clone, Serialize)]
pub struct EtlOutcome {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub database_path: PathBuf,
    pub table: TableName,
    pub sources: Vec<SourceInfo>,
    pub stats: TransformStats,
    /// Rows written to the table
    pub loaded: usize,
    /// The rows as written
    #[serde(skip)]
    pub rows: Vec<TransformedOrderRow>,
}

/// Run the pipeline over files on disk.
///
/// Every source path is checked before anything is read, so a missing file
/// aborts the run without touching the database.
pub fn run_etl(sources: &[SourceFile], options: &EtlOptions) -> PipelineResult<EtlOutcome> {
    if sources.is_empty() {
        return Err(PipelineError::NoSources);
    }

    if let Some(missing) = sources.iter().find(|s| !s.path.exists()) {
        return Err(ReadError::NotFound(missing.path.clone()).into());
    }

    let started_at = Utc::now().to_rfc3339();

    log_info("📖 Reading regional exports...");
    let mut parsed = Vec::with_capacity(sources.len());
    for source in sources {
        let result = read_orders_with_metadata(&source.path, &source.region)?;
        parsed.push((display_name(&source.path), source.region.clone(), result));
    }

    finish_run(parsed, options, started_at)
}

/// Run the pipeline over in-memory exports as `(name, region, bytes)`.
pub fn run_etl_bytes(
    uploads: &[(String, String, Vec<u8>)],
    options: &EtlOptions,
) -> PipelineResult<EtlOutcome> {
    if uploads.is_empty() {
        return Err(PipelineError::NoSources);
    }

    let started_at = Utc::now().to_rfc3339();

    log_info("📖 Reading uploaded exports...");
    let mut parsed = Vec::with_capacity(uploads.len());
    for (name, region, bytes) in uploads {
        let result = parse_bytes_auto(bytes, region)?;
        parsed.push((name.clone(), region.clone(), result));
    }

    finish_run(parsed, options, started_at)
}

/// Concatenate, transform, load.
fn finish_run(
    parsed: Vec<(String, String, ParseResult)>,
    options: &EtlOptions,
    started_at: String,
) -> PipelineResult<EtlOutcome> {
    let mut sources = Vec::with_capacity(parsed.len());
    let mut combined = Vec::new();

    for (name, region, result) in parsed {
        log_success(format!(
            "{} → region {}: {} rows ({}, '{}')",
            name,
            region,
            result.rows.len(),
            result.encoding,
            format_delimiter(result.delimiter)
        ));
        sources.push(SourceInfo {
            name,
            region,
            encoding: result.encoding,
            delimiter: result.delimiter,
            row_count: result.rows.len(),
        });
        combined.extend(result.rows);
    }

    log_info(format!("⚙️  Transforming {} rows...", combined.len()));
    let output = transform_orders(combined);
    print_stats(&output.stats);

    log_info(format!(
        "💾 Replacing {}::{}...",
        options.database_path.display(),
        options.table
    ));
    let loaded = load_orders(&output.rows, &options.database_path, &options.table)?;
    log_success(format!("Loaded {} rows", loaded));

    Ok(EtlOutcome {
        run_id: Uuid::new_v4().to_string(),
        started_at,
        finished_at: Utc::now().to_rfc3339(),
        database_path: options.database_path.clone(),
        table: options.table.clone(),
        sources,
        stats: output.stats,
        loaded,
        rows: output.rows,
    })
}

fn print_stats(stats: &TransformStats) {
    log_success(format!("{} rows kept", stats.output_rows));
    if stats.filtered_non_positive > 0 {
        log_info_indent(
            format!("{} rows with net_sale <= 0 dropped", stats.filtered_non_positive),
            1,
        );
    }
    if stats.duplicates_removed > 0 {
        log_info_indent(
            format!("{} duplicate OrderId rows dropped", stats.duplicates_removed),
            1,
        );
    }
    if stats.blank_order_ids > 0 {
        log_warning(format!("{} rows without OrderId dropped", stats.blank_order_ids));
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Format delimiter for display
fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{fetch_orders, open_database};
    use std::fs;
    use tempfile::tempdir;

    const HEADER: &str = "OrderId,OrderItemId,QuantityOrdered,ItemPrice,PromotionDiscount,batch_id";

    fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("{}\n{}", HEADER, body)).unwrap();
        path
    }

    fn options(dir: &Path) -> EtlOptions {
        EtlOptions {
            database_path: dir.join("out").join("sales.db"),
            table: TableName::default(),
        }
    }

    #[test]
    fn test_two_regions_end_to_end() {
        let dir = tempdir().unwrap();
        let a = write_csv(
            dir.path(),
            "a.csv",
            "100,1,5,10,0,1\n200,2,2,10.0,5.0,1\n300,3,1,5,5,1\n",
        );
        let b = write_csv(
            dir.path(),
            "b.csv",
            "100,4,3,25,,2\n0400,5,1,9.5,\"{\"\"Amount\"\": 1.5}\",2\n",
        );

        let opts = options(dir.path());
        let outcome = run_etl(&[SourceFile::new(&a, "A"), SourceFile::new(&b, "B")], &opts).unwrap();

        assert_eq!(outcome.loaded, 3);
        assert_eq!(outcome.stats.input_rows, 5);
        assert_eq!(outcome.sources.len(), 2);

        let conn = open_database(&opts.database_path).unwrap();
        let rows = fetch_orders(&conn, &opts.table).unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.order_id.as_str()).collect();
        assert_eq!(ids, vec!["0400", "100", "200"]);

        assert_eq!(rows[0].net_sale, 8.0);
        assert_eq!(rows[0].region, "B");
        assert_eq!(rows[1].net_sale, 75.0);
        assert_eq!(rows[1].region, "B");
        assert_eq!(rows[2].net_sale, 15.0);
        assert_eq!(rows[2].region, "A");
        assert!(rows.iter().all(|r| r.net_sale > 0.0));
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let dir = tempdir().unwrap();
        let a = write_csv(dir.path(), "a.csv", "1,1,1,10,,1\n2,1,2,3,1,1\n");
        let sources = [SourceFile::new(&a, "A")];
        let opts = options(dir.path());

        run_etl(&sources, &opts).unwrap();
        let conn = open_database(&opts.database_path).unwrap();
        let first = fetch_orders(&conn, &opts.table).unwrap();

        run_etl(&sources, &opts).unwrap();
        let second = fetch_orders(&conn, &opts.table).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_missing_source_aborts_before_load() {
        let dir = tempdir().unwrap();
        let a = write_csv(dir.path(), "a.csv", "1,1,1,10,,1\n");
        let missing = dir.path().join("b.csv");
        let opts = options(dir.path());

        let err = run_etl(&[SourceFile::new(&a, "A"), SourceFile::new(&missing, "B")], &opts)
            .unwrap_err();

        match err {
            PipelineError::Read(ReadError::NotFound(path)) => assert_eq!(path, missing),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert!(!opts.database_path.exists());
    }

    #[test]
    fn test_no_sources_is_error() {
        let dir = tempdir().unwrap();
        let result = run_etl(&[], &options(dir.path()));
        assert!(matches!(result, Err(PipelineError::NoSources)));
    }

    #[test]
    fn test_bytes_entry_point() {
        let dir = tempdir().unwrap();
        let opts = options(dir.path());
        let uploads = vec![
            ("a.csv".to_string(), "A".to_string(), format!("{}\n1,1,2,10,5,1\n", HEADER).into_bytes()),
            ("b.csv".to_string(), "B".to_string(), format!("{}\n2,1,1,1,1,1\n", HEADER).into_bytes()),
        ];

        let outcome = run_etl_bytes(&uploads, &opts).unwrap();
        assert_eq!(outcome.loaded, 1);
        assert_eq!(outcome.rows[0].order_id, "1");
        assert_eq!(outcome.rows[0].region, "A");
        assert_eq!(outcome.stats.filtered_non_positive, 1);
    }
}
