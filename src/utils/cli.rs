//! Running the CLI

// Allow exits because in this file we ideally handle all errors with known exit codes
#![allow(clippy::exit)]
// Results are written to stdout for piping; logs go to stderr or the log file
#![allow(clippy::print_stdout)]

use crate::batch::{self, BatchConfig, InsertResult, InsertSpec};
use crate::db::debug::compose_query;
use crate::db::{self, DatabaseConnection, Db, Tx, Value};
use crate::utils::config::Config;
use clap::Parser;
use std::ffi::OsStr;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Insert JSON rows through a single `INSERT ... VALUES (?, ...)` template and
/// print the generated id of every row.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file. Missing files are ignored.
    #[arg(short, long, default_value_t = String::from("sqlbatch.toml"))]
    config: String,
    /// Database URL. Overrides `DATABASE_URL` and the config file.
    #[arg(short, long)]
    database_url: Option<String>,
    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// sqlbatch cli subcommands
    #[command(subcommand)]
    subcommands: Subcommands,
}

///
#[derive(Clone, clap::Subcommand)]
enum Subcommands {
    /// Insert rows and print `{"id": .., "row": [..]}` per row
    Insert {
        /// Insert statement with one `VALUES` marker, e.g. `INSERT INTO t (a, b) VALUES (?, ?)`.
        #[arg(short, long)]
        template: String,
        /// JSON file holding an array of rows, each an array of bind values.
        #[arg(short, long)]
        input: PathBuf,
        /// Run all chunks in one transaction, so nothing is kept unless every chunk succeeds.
        #[arg(long, default_value_t = false)]
        atomic: bool,
    },
    /// Print a statement with its arguments inlined
    Compose {
        /// Statement with `?` placeholders.
        #[arg(short, long)]
        template: String,
        /// JSON array of arguments.
        #[arg(short, long)]
        args: String,
    },
}

/// Log to stderr, or to `log_file` when given.
/// The returned guard flushes the file writer on drop.
fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return None;
    };
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().unwrap_or_else(|| OsStr::new("sqlbatch.log"));
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

/// Main entrypoint to application
pub fn run() {
    let cli = Cli::parse();
    let guard = init_tracing(cli.log_file.as_deref());
    tracing::debug!("Starting application");

    let outcome = async_std::task::block_on(execute(cli));
    if let Err(err) = outcome {
        tracing::error!("{err:#}");
        drop(guard);
        std::process::exit(1);
    }
}

/// Dispatch a parsed command line.
async fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.subcommands {
        Subcommands::Insert {
            template,
            input,
            atomic,
        } => {
            let mut config = Config::load(Path::new(&cli.config))?;
            if let Some(url) = cli.database_url {
                config.database.url = Some(url);
            }
            let conn = db::init::connect(&config.database).await?;
            let rows = read_rows(&input)?;
            for line in insert_rows(&conn, &template, rows, atomic, &config.batch).await? {
                println!("{line}");
            }
            Ok(())
        }
        Subcommands::Compose { template, args } => {
            println!("{}", compose(&template, &args)?);
            Ok(())
        }
    }
}

/// Rows of bind values from a JSON file.
fn read_rows(input: &Path) -> anyhow::Result<Vec<Vec<serde_json::Value>>> {
    let text = read_to_string(input)
        .map_err(|err| anyhow::anyhow!("could not read {}: {err}", input.display()))?;
    let rows = serde_json::from_str(&text)?;
    Ok(rows)
}

/// `template` with the JSON array `args` inlined.
fn compose(template: &str, args: &str) -> anyhow::Result<String> {
    let args: Vec<serde_json::Value> = serde_json::from_str(args)?;
    let args: Vec<Value> = args.iter().map(Value::from).collect();
    Ok(compose_query(template, &args))
}

/// Insert `rows` and return one `{"id": .., "row": [..]}` line per row.
async fn insert_rows(
    conn: &DatabaseConnection,
    template: &str,
    rows: Vec<Vec<serde_json::Value>>,
    atomic: bool,
    config: &BatchConfig,
) -> anyhow::Result<Vec<serde_json::Value>> {
    let spec = InsertSpec::new(template, rows, |row: &Vec<serde_json::Value>| {
        row.iter().map(Value::from).collect()
    });
    let results: Vec<InsertResult<Vec<serde_json::Value>>> = if atomic {
        let mut tx = conn.begin().await?;
        let outcome = batch::insert(spec, &mut tx.context(), config).await;
        match outcome {
            Ok(results) => {
                tx.commit().await?;
                results
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!("Failed to roll back the insert: {rollback_err:?}");
                }
                return Err(err.into());
            }
        }
    } else {
        batch::insert(spec, &mut conn.context(), config)
            .await
            .inspect_err(|err| {
                if err.is_partial() {
                    tracing::warn!("{} rows were committed before the failure", err.inserted());
                }
            })?
    };
    Ok(results
        .into_iter()
        .map(|result| serde_json::json!({ "id": result.id, "row": result.item }))
        .collect())
}
