//! Storekeeper CLI - Inspect store fixtures and run lifecycle sweeps.
//!
//! # Usage
//!
//! ```bash
//! # List the plan catalog
//! sk-cli plans
//!
//! # Show status, expiration info and usage of every store in a fixture
//! sk-cli inspect -f stores.yaml --at 2026-02-01T00:00:00Z
//!
//! # Reconcile every store in a fixture and print the report as JSON
//! sk-cli sweep -f stores.yaml --at 2026-02-01T00:00:00Z --json
//! ```
//!
//! # Commands
//!
//! - `plans` - List available plans
//! - `inspect` - Read-only view of fixture stores at an instant
//! - `sweep` - Reconcile fixture stores and report transitions and notices
//!
//! Engine settings come from the environment (see `EngineConfig::from_env`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sk-cli")]
#[command(author, version, about = "Storekeeper CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the plan catalog
    Plans,
    /// Show store status without changing anything
    Inspect {
        /// YAML fixture describing stores
        #[arg(short, long)]
        fixture: PathBuf,

        /// Evaluation instant (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        /// Only show this store
        #[arg(short, long)]
        store: Option<i32>,
    },
    /// Reconcile every store and report what changed
    Sweep {
        /// YAML fixture describing stores
        #[arg(short, long)]
        fixture: PathBuf,

        /// Evaluation instant (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storekeeper_engine=info,storekeeper_cli=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Plans => commands::plans::list(),
        Commands::Inspect { fixture, at, store } => {
            let now = at.unwrap_or_else(Utc::now);
            commands::inspect::run(&fixture, now, store).await?;
        }
        Commands::Sweep { fixture, at, json } => {
            let now = at.unwrap_or_else(Utc::now);
            commands::sweep::run(&fixture, now, json).await?;
        }
    }
    Ok(())
}
