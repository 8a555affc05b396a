//! startpage: a personal start-page dashboard.
//!
//! The `startpage` binary serves the dashboard over HTTP and offers a few
//! maintenance commands (import, export, seed, tree) against the same SQLite
//! file. Command output is JSON by default with an optional `--pretty` flag.

mod db;
mod models;
mod output;
mod repo;
mod server;
mod transfer;
mod validation;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use db::DashError;
use output::OutputMode;
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;

/// A personal start page: tabs of widgets holding ordered links and notes.
///
/// All data lives in one SQLite file shared by the server and the CLI.
#[derive(Parser)]
#[command(name = "startpage", version, about)]
struct Cli {
    /// Database file (default: $STARTPAGE_DB or ~/.startpage/startpage.db).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Output in human-readable format instead of JSON.
    #[arg(long, global = true)]
    pretty: bool,

    /// Log at info level (otherwise RUST_LOG, default warn).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server.
    Serve {
        /// Address to bind (default: $STARTPAGE_HOST or 127.0.0.1).
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (default: $STARTPAGE_PORT or 8000).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Import a legacy bookmark export or a backup file.
    Import {
        /// Path to the JSON file.
        file: PathBuf,
    },
    /// Write a full backup as JSON.
    Export {
        /// Write to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Replace all data with the demo dashboard.
    Seed,
    /// Print pages with their widgets and links.
    Tree {
        /// Only this page (by slug).
        #[arg(long)]
        page: Option<String>,
    },
}

/// Resolve the database path from `--db`, `$STARTPAGE_DB`, then the default.
fn resolve_db_path(cli: &Cli) -> Result<PathBuf, DashError> {
    match &cli.db {
        Some(path) => Ok(path.clone()),
        None => db::db_path(),
    }
}

/// Resolve the listen host from the flag, then `$STARTPAGE_HOST`.
fn resolve_host(flag: Option<String>, env: Option<String>) -> String {
    flag.or(env)
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_HOST.to_string())
}

/// Resolve the listen port from the flag, then `$STARTPAGE_PORT`.
fn resolve_port(flag: Option<u16>, env: Option<String>) -> Result<u16, DashError> {
    if let Some(port) = flag {
        return Ok(port);
    }
    match env {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| DashError::InvalidInput(format!("Invalid STARTPAGE_PORT '{}'", value))),
        None => Ok(DEFAULT_PORT),
    }
}

/// Set up logging on stderr so JSON output on stdout stays clean.
fn init_tracing(verbose: bool) {
    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Open the database and run migrations.
fn open_db(path: &Path) -> Result<Connection, DashError> {
    let mut conn = db::open_connection_at(path)?;
    db::run_migrations(&mut conn)?;
    Ok(conn)
}

fn run() -> Result<(), DashError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mode = if cli.pretty {
        OutputMode::Pretty
    } else {
        OutputMode::Json
    };
    let db_path = resolve_db_path(&cli)?;

    match &cli.command {
        Commands::Serve { host, port } => {
            let config = server::ServerConfig {
                host: resolve_host(host.clone(), std::env::var("STARTPAGE_HOST").ok()),
                port: resolve_port(*port, std::env::var("STARTPAGE_PORT").ok())?,
                db_path,
            };
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(server::run_server(config))?;
        }
        Commands::Import { file } => {
            let conn = open_db(&db_path)?;
            let text = std::fs::read_to_string(file)?;
            let summary = transfer::import_json(&conn, &text)?;
            tracing::info!(file = %file.display(), ?summary, "Imported");
            output::print(mode, &summary, || output::print_pretty_summary(&summary));
        }
        Commands::Export { output: target } => {
            let conn = open_db(&db_path)?;
            let backup = transfer::export_backup(&conn)?;
            let json = serde_json::to_string_pretty(&backup)?;
            match target {
                Some(path) => {
                    std::fs::write(path, json + "\n")?;
                    tracing::info!(file = %path.display(), pages = backup.pages.len(), "Exported");
                }
                None => println!("{}", json),
            }
        }
        Commands::Seed => {
            let conn = open_db(&db_path)?;
            let summary = transfer::seed_demo(&conn)?;
            output::print(mode, &summary, || output::print_pretty_summary(&summary));
        }
        Commands::Tree { page } => {
            let conn = open_db(&db_path)?;
            let pages = match page {
                Some(slug) => vec![repo::get_page_by_slug(&conn, slug)?],
                None => repo::list_pages(&conn)?,
            };
            let trees = pages
                .into_iter()
                .map(|p| repo::load_page_tree(&conn, p))
                .collect::<Result<Vec<_>, _>>()?;
            output::print(mode, &trees, || output::print_pretty_trees(&trees));
        }
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        let error_json = serde_json::json!({
            "error": e.to_string()
        });
        eprintln!("{}", error_json);
        process::exit(1);
    }
}
