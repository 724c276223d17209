//! CLI command definitions and dispatch.

pub mod feed;
pub mod inspect;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kiosk_core::KioskConfig;

/// Library attendance kiosk
#[derive(Debug, Parser)]
#[command(name = "kiosk", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/kiosk.toml")]
    pub config: PathBuf,

    /// Log level override (`RUST_LOG` takes precedence)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the scanner kiosk on stdin
    Run(run::RunArgs),
    /// Print the live feed of recent visits on every poll
    Feed(feed::FeedArgs),
    /// Show how a raw scan is sanitized and interpreted
    Inspect(inspect::InspectArgs),
}

impl Commands {
    /// Execute the command with the loaded configuration
    pub async fn execute(&self, config: KioskConfig) -> anyhow::Result<()> {
        match self {
            Commands::Run(args) => run::execute(args, config).await,
            Commands::Feed(args) => feed::execute(args, config).await,
            Commands::Inspect(args) => inspect::execute(args),
        }
    }
}
