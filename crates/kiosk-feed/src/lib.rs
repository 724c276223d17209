//! Administrative live feed of recent visits.
//!
//! A [`LiveFeedPoller`] polls the attendance service on a fixed interval and
//! publishes deduplicated [`LiveFeed`] snapshots, newest event first, one
//! entry per identified student.

pub mod dedup;
pub mod poller;

pub use dedup::{LiveFeed, dedupe, format_entry, sort_by_latest_event};
pub use poller::{LiveFeedHandle, LiveFeedPoller};
