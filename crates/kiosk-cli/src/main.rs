//! Attendance kiosk entry point.
//!
//! Loads configuration, initializes logging on stderr and runs the chosen
//! subcommand on a single-threaded runtime.

use std::io::{self, IsTerminal};

use anyhow::Context;
use clap::Parser;
use kiosk_core::KioskConfig;
use kiosk_core::config::LoggingConfig;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;
mod console;
mod operator;
mod terminal;

use commands::Cli;
use terminal::CrlfWriter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = KioskConfig::load(Some(cli.config.as_path()))
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    init_logging(&config.logging);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(cli.command.execute(config))
}

/// Initialize tracing on stderr; stdout is the operator display.
///
/// On a terminal, lines end in CRLF so they stay aligned in raw mode.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let writer = if io::stderr().is_terminal() {
        BoxMakeWriter::new(|| CrlfWriter::new(io::stderr()))
    } else {
        BoxMakeWriter::new(io::stderr)
    };

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(writer)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(writer)
                .init();
        }
    }
}
