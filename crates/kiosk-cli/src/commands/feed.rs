//! `kiosk feed`: print the live feed until interrupted.

use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use kiosk_client::HttpAttendanceClient;
use kiosk_core::KioskConfig;
use kiosk_core::time::format_clock;
use kiosk_feed::{LiveFeed, LiveFeedPoller};
use tracing::info;

#[derive(Debug, Args)]
pub struct FeedArgs {
    /// Polling interval in seconds
    #[arg(long)]
    pub interval: Option<u64>,

    /// Number of recent visits requested per poll
    #[arg(long)]
    pub limit: Option<u32>,

    /// Print each snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: &FeedArgs, mut config: KioskConfig) -> anyhow::Result<()> {
    if let Some(interval) = args.interval {
        config.feed.poll_interval_secs = interval;
    }
    if let Some(limit) = args.limit {
        config.feed.limit = limit;
    }
    config.validate().context("invalid configuration")?;

    let api = Arc::new(
        HttpAttendanceClient::new(&config.service).context("failed to create service client")?,
    );
    let handle = LiveFeedPoller::new(api, &config.feed).start();
    let mut updates = handle.subscribe();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if let Some(feed) = snapshot {
                    print_feed(&feed, args.json)?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping live feed");
                break;
            }
        }
    }

    handle.stop().await;
    Ok(())
}

fn print_feed(feed: &LiveFeed, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(feed)?);
        return Ok(());
    }

    let total = feed
        .total
        .map(|t| format!(", {t} today"))
        .unwrap_or_default();
    println!(
        "Live feed at {}: {} inside, {} left{total}",
        format_clock(feed.refreshed_at),
        feed.time_ins().count(),
        feed.time_outs().count(),
    );
    if feed.is_empty() {
        println!("  No recent activity");
    }
    for line in feed.lines() {
        println!("  {line}");
    }
    Ok(())
}
