//! Periodic polling of the recent-visits endpoint.
//!
//! [`LiveFeedPoller::start`] spawns a task that fetches one page of recent
//! visits on a fixed interval, turns it into a [`LiveFeed`] and publishes it
//! through a `watch` channel. Each snapshot replaces the previous one.
//!
//! Every tick runs under a child [`Liveness`] token. After
//! [`LiveFeedHandle::stop`] (or dropping the handle) the task exits at its
//! next await point and a response still in flight is never published.
//! A failed poll is logged and the previous snapshot stays in place.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kiosk_client::AttendanceApi;
use kiosk_core::Liveness;
use kiosk_core::config::FeedConfig;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::dedup::LiveFeed;

/// Shortest accepted polling interval.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Builder and configuration for a live feed polling task.
#[derive(Debug)]
pub struct LiveFeedPoller<A> {
    api: Arc<A>,
    interval: Duration,
    limit: u32,
}

impl<A> LiveFeedPoller<A>
where
    A: AttendanceApi + 'static,
{
    pub fn new(api: Arc<A>, config: &FeedConfig) -> Self {
        Self {
            api,
            interval: config.poll_interval(),
            limit: config.limit,
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Spawn the polling task. The first poll happens immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> LiveFeedHandle {
        let (tx, rx) = watch::channel(None);
        let liveness = Liveness::new();
        let task = tokio::spawn(poll_loop(
            self.api,
            self.interval,
            self.limit,
            tx,
            liveness.clone(),
        ));
        info!(
            interval_secs = self.interval.as_secs_f64(),
            limit = self.limit,
            "Live feed polling started"
        );
        LiveFeedHandle {
            feed: rx,
            liveness,
            task: Some(task),
        }
    }
}

async fn poll_loop<A: AttendanceApi>(
    api: Arc<A>,
    interval: Duration,
    limit: u32,
    tx: watch::Sender<Option<LiveFeed>>,
    liveness: Liveness,
) {
    let mut ticker = tokio::time::interval(interval.max(MIN_POLL_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = liveness.retired() => break,
            _ = ticker.tick() => {}
        }

        let tick = liveness.child();
        let result = tokio::select! {
            biased;
            () = tick.retired() => break,
            result = api.recent_visits(1, limit) => result,
        };

        match result {
            Ok(page) => {
                let feed = LiveFeed::from_page(page, Utc::now());
                let entries = feed.len();
                let published = tick.apply_if_alive(feed, |feed| {
                    tx.send_replace(Some(feed));
                });
                if published {
                    debug!(entries, "Live feed refreshed");
                } else {
                    debug!("Discarding live feed snapshot after stop");
                }
            }
            Err(e) => warn!(error = %e, "Live feed poll failed, keeping previous snapshot"),
        }
    }

    info!("Live feed polling stopped");
}

/// Handle to a running poller. Dropping it stops polling.
#[derive(Debug)]
pub struct LiveFeedHandle {
    feed: watch::Receiver<Option<LiveFeed>>,
    liveness: Liveness,
    task: Option<JoinHandle<()>>,
}

impl LiveFeedHandle {
    /// Latest published snapshot, if any poll has succeeded.
    pub fn latest(&self) -> Option<LiveFeed> {
        self.feed.borrow().clone()
    }

    /// A receiver notified on every new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Option<LiveFeed>> {
        self.feed.clone()
    }

    pub fn is_running(&self) -> bool {
        self.liveness.is_alive() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop polling and wait for the task to exit.
    pub async fn stop(mut self) {
        self.liveness.retire();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "Live feed task ended abnormally");
        }
    }
}

impl Drop for LiveFeedHandle {
    fn drop(&mut self) {
        self.liveness.retire();
    }
}
