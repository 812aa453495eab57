//! Orderload CLI - consolidate regional order exports into SQLite
//!
//! # Main Commands
//!
//! ```bash
//! orderload etl                       # Load both regions into sales.db::orders
//! orderload etl --check               # Same, then run the validation queries
//! orderload serve                     # Start HTTP server (port 3000)
//! orderload import-jokes --target 50  # Import jokes from JokeAPI
//! ```
//!
//! # Inspection Commands
//!
//! ```bash
//! orderload queries                   # Print the validation queries
//! orderload check                     # Run them against an existing database
//! ```

use clap::{Parser, Subcommand};
use orderload::{
    api::logs::LOG_BROADCASTER, import_jokes, open_database, run_checks, run_etl,
    validation_queries, AppConfig, EtlOptions, HttpJokeSource, SourceFile, TableName,
    ValidationReport,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "orderload")]
#[command(about = "Consolidate regional order exports into a SQLite table", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read, clean and load both regional exports
    Etl {
        /// Region A export
        #[arg(long, default_value = "order_region_a(in).csv")]
        region_a: PathBuf,

        /// Region B export
        #[arg(long, default_value = "order_region_b(in).csv")]
        region_b: PathBuf,

        /// SQLite database file (default: sales.db or ETL_DATABASE_PATH)
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Destination table (default: orders or ETL_TABLE)
        #[arg(short, long)]
        table: Option<String>,

        /// Run the validation queries after loading
        #[arg(long)]
        check: bool,
    },

    /// Print the validation queries
    Queries {
        /// Table the queries target
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Run the validation queries against an existing database
    Check {
        /// SQLite database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Table to check
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Import jokes from JokeAPI
    ImportJokes {
        /// Number of jokes to request
        #[arg(long, default_value = "100", allow_negative_numbers = true)]
        target: i64,

        /// SQLite database file (default: jokes.db or JOKES_DATABASE_PATH)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: 3000 or PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database file for uploads
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match AppConfig::from_env() {
        Ok(config) => match cli.command {
            Commands::Etl {
                region_a,
                region_b,
                database,
                table,
                check,
            } => cmd_etl(&config, region_a, region_b, database, table, check),

            Commands::Queries { table } => cmd_queries(&config, table),

            Commands::Check { database, table } => cmd_check(&config, database, table),

            Commands::ImportJokes { target, database } => {
                cmd_import_jokes(&config, target, database).await
            }

            Commands::Serve { port, database } => cmd_serve(config, port, database).await,
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn resolve_table(
    config: &AppConfig,
    table: Option<String>,
) -> Result<TableName, Box<dyn std::error::Error>> {
    match table {
        Some(name) => Ok(TableName::parse(name)?),
        None => Ok(config.table.clone()),
    }
}

fn cmd_etl(
    config: &AppConfig,
    region_a: PathBuf,
    region_b: PathBuf,
    database: Option<PathBuf>,
    table: Option<String>,
    check: bool,
) -> CliResult {
    let options = EtlOptions {
        database_path: database.unwrap_or_else(|| config.database_path.clone()),
        table: resolve_table(config, table)?,
    };
    let sources = [SourceFile::new(region_a, "A"), SourceFile::new(region_b, "B")];

    // The summary below is the CLI's own output
    LOG_BROADCASTER.set_echo(false);
    let outcome = run_etl(&sources, &options)?;

    println!(
        "Loaded {} rows into {}::{}.",
        outcome.loaded,
        outcome.database_path.display(),
        outcome.table
    );
    print_queries(&outcome.table);

    if check {
        let report = check_database(&outcome.database_path, &outcome.table)?;
        ensure_clean(&report)?;
    }

    Ok(())
}

fn cmd_queries(config: &AppConfig, table: Option<String>) -> CliResult {
    let table = resolve_table(config, table)?;
    print_queries(&table);
    Ok(())
}

fn cmd_check(config: &AppConfig, database: Option<PathBuf>, table: Option<String>) -> CliResult {
    let database = database.unwrap_or_else(|| config.database_path.clone());
    if !database.exists() {
        return Err(format!("Database not found: {}", database.display()).into());
    }

    let table = resolve_table(config, table)?;
    let report = check_database(&database, &table)?;
    ensure_clean(&report)
}

async fn cmd_import_jokes(
    config: &AppConfig,
    target: i64,
    database: Option<PathBuf>,
) -> CliResult {
    let database = database.unwrap_or_else(|| config.jokes_database_path.clone());
    let source = HttpJokeSource::new(config.joke_api_base_url.clone())?;

    let counts = import_jokes(&source, target, database).await?;
    println!("{}", serde_json::to_string_pretty(&counts)?);
    Ok(())
}

async fn cmd_serve(
    mut config: AppConfig,
    port: Option<u16>,
    database: Option<PathBuf>,
) -> CliResult {
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(database) = database {
        config.database_path = database;
    }
    orderload::server::start_server(config).await
}

fn print_queries(table: &TableName) {
    println!("Validation queries:");
    for query in validation_queries(table) {
        println!("- {}: {}", query.label, query.sql);
    }
}

fn check_database(
    database: &Path,
    table: &TableName,
) -> Result<ValidationReport, Box<dyn std::error::Error>> {
    let conn = open_database(database)?;
    let report = run_checks(&conn, table)?;

    println!("\n✔️  Validation:");
    println!("   Rows: {}", report.row_count);
    println!("   Duplicate OrderIds: {}", report.duplicate_orders.len());
    for dup in report.duplicate_orders.iter().take(5) {
        println!("     - {} ({} rows)", dup.order_id, dup.occurrences);
    }
    println!("   Non-positive net sales: {}", report.non_positive_net_sales.len());
    for region in &report.sales_by_region {
        println!("   Region {}: {:.2}", region.region, region.total_net_sale);
    }

    if report.is_clean() {
        println!("   ✅ Clean");
    } else {
        println!("   ⚠️  Issues found");
    }

    Ok(report)
}

/// Turn a report with duplicates or non-positive rows into a CLI failure.
fn ensure_clean(report: &ValidationReport) -> CliResult {
    if report.is_clean() {
        Ok(())
    } else {
        Err(format!(
            "validation found issues: {} duplicate OrderIds, {} non-positive net sales",
            report.duplicate_orders.len(),
            report.non_positive_net_sales.len()
        )
        .into())
    }
}
