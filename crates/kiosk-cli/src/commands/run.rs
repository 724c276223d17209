//! `kiosk run`: the scanner kiosk on the controlling terminal.
//!
//! The terminal is switched to raw mode with bracketed paste for the whole
//! session and restored on exit. Ctrl-C or Ctrl-D ends the session once the
//! call in flight settles.

use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use kiosk_client::HttpAttendanceClient;
use kiosk_core::KioskConfig;
use kiosk_scanner::TerminalSource;
use kiosk_session::{KioskRuntime, OperatorCommand, RuntimeHandle};
use tokio::sync::mpsc;
use tracing::info;

use crate::console::{ConsoleFeedback, ConsoleSource};
use crate::terminal::{RawTerminal, display};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Device identifier reported with each check-in
    #[arg(long)]
    pub device_id: Option<String>,

    /// Attendance service base URL
    #[arg(long)]
    pub service_url: Option<String>,
}

pub async fn execute(args: &RunArgs, mut config: KioskConfig) -> anyhow::Result<()> {
    if let Some(device_id) = &args.device_id {
        config.kiosk.device_id = device_id.clone();
    }
    if let Some(url) = &args.service_url {
        config.service.base_url = url.clone();
    }
    config.validate().context("invalid configuration")?;

    let api = Arc::new(
        HttpAttendanceClient::new(&config.service).context("failed to create service client")?,
    );
    info!(
        service = %api.base_url(),
        device_id = %config.kiosk.device_id,
        "Starting kiosk"
    );

    let _terminal = RawTerminal::enter().context("failed to switch the terminal to raw mode")?;
    display("Operator commands start with ':'. Press Ctrl-C to quit.");

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let source = ConsoleSource::new(TerminalSource::new(), command_tx);
    let (runtime, handle) = KioskRuntime::new(api, source, ConsoleFeedback::default(), &config);

    let session = async {
        let (result, ()) = tokio::join!(runtime.run(), forward_commands(command_rx, handle.clone()));
        result
    };
    tokio::pin!(session);

    tokio::select! {
        result = &mut session => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            handle.shutdown();
            session.await?;
        }
    }
    Ok(())
}

/// Forward operator commands parsed from the console until the console
/// source is dropped.
async fn forward_commands(mut commands: mpsc::UnboundedReceiver<OperatorCommand>, handle: RuntimeHandle) {
    while let Some(command) = commands.recv().await {
        if handle.send(command).await.is_err() {
            break;
        }
    }
}
