//! DealPulse Control - operator CLI for the health-score sweep
//!
//! Runs the sweep against a local database or asks a running daemon to do it.

use anyhow::Result;
use clap::{Parser, Subcommand};
use dealpulse_common::{logging, Config, LogLevel, VERSION};
use dealpulsectl::client::{self, TriggerOutcome};
use dealpulsectl::{commands, output};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "dealpulsectl")]
#[command(about = "DealPulse - deal health-score automation", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log level for diagnostics on stderr (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn", value_parser = commands::parse_log_level)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute and persist health scores in this process
    Run {
        /// Deal database (defaults to the configured path)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Evaluate as of this RFC 3339 instant instead of now
        #[arg(long)]
        now: Option<String>,
    },

    /// Show what a sweep would change without writing
    Preview {
        #[arg(long)]
        db: Option<PathBuf>,

        #[arg(long)]
        now: Option<String>,
    },

    /// Ask a running dealpulsed to sweep
    Trigger {
        #[arg(long, default_value = client::DEFAULT_URL)]
        url: String,

        /// Seconds to wait for the sweep to finish
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },

    /// Create the users/deals tables if missing
    InitDb {
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Write a default config file
    InitConfig {
        #[arg(long, default_value = dealpulse_common::config::CONFIG_PATH)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.log_level);
    let loaded = Config::load()?;
    for warning in &loaded.warnings {
        tracing::warn!(target: "dealpulsectl", "{}", warning);
    }
    let config = loaded.config;

    match cli.command {
        Commands::Run { db, now } => {
            let db = commands::resolve_db_path(db, &config);
            let now = commands::parse_now(now.as_deref())?;
            let summary = tokio::task::spawn_blocking(move || commands::sweep_local(&db, now, true)).await??;
            print_summary(&summary, cli.json);
        }
        Commands::Preview { db, now } => {
            let db = commands::resolve_db_path(db, &config);
            let now = commands::parse_now(now.as_deref())?;
            let summary = tokio::task::spawn_blocking(move || commands::sweep_local(&db, now, false)).await??;
            print_summary(&summary, cli.json);
        }
        Commands::Trigger { url, timeout } => {
            match client::trigger(&url, Duration::from_secs(timeout)).await? {
                TriggerOutcome::Completed(summary) => print_summary(&summary, cli.json),
                TriggerOutcome::Failed(failure) => {
                    if cli.json {
                        println!("{}", output::render_json(&failure));
                    } else {
                        eprint!("{}", output::render_failure(&failure));
                    }
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::InitDb { db } => {
            let db = commands::resolve_db_path(db, &config);
            commands::init_db(&db)?;
            println!("Initialized {}", db.display());
        }
        Commands::InitConfig { path, force } => {
            commands::init_config(&path, force)?;
            println!("Wrote default config to {}", path.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_summary(summary: &dealpulse_common::SweepSummary, json: bool) {
    if json {
        println!("{}", output::render_json(summary));
    } else {
        print!("{}", output::render_summary(summary));
    }
}
