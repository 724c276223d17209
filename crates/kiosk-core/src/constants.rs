//! Core constants for the attendance kiosk.
//!
//! This module centralizes the timing thresholds, limits, and service
//! paths shared by the scanner pipeline, the session machine and the
//! administrative live feed.
//!
//! # Usage
//!
//! ```
//! use kiosk_core::constants::*;
//! use std::time::Duration;
//!
//! let gap = Duration::from_millis(DEFAULT_SCAN_GAP_MS);
//! assert_eq!(gap.as_millis(), 500);
//! ```

// ============================================================================
// Scanner Timing
// ============================================================================

/// Maximum pause between two characters of the same scan, in milliseconds.
///
/// Keyboard-emulating scanners type a full code in a few tens of
/// milliseconds. A longer pause means the previous characters belong to an
/// unrelated (abandoned) input, so the decoder starts over.
pub const DEFAULT_SCAN_GAP_MS: u64 = 500;

/// Upper bound on the decoder buffer, in characters.
///
/// A stuck key or a runaway stream without Enter would otherwise grow the
/// buffer forever. When exceeded, the buffer is discarded.
pub const MAX_SCAN_LENGTH: usize = 4096;

// ============================================================================
// Session Machine
// ============================================================================

/// Maximum number of state transitions kept in the session history.
pub const MAX_HISTORY_SIZE: usize = 100;

/// Number of visit history entries shown for the identified student.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// Device identifier reported to the service when none is configured.
pub const DEFAULT_DEVICE_ID: &str = "kiosk-1";

// ============================================================================
// Remote Service
// ============================================================================

/// Default base URL of the attendance service.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000";

/// Default timeout for a single service request, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

/// Scan resolution endpoint.
pub const PATH_SCAN: &str = "/api/attendance/scan";

/// Check-in (time in) endpoint.
pub const PATH_TIME_IN: &str = "/api/attendance/time-in";

/// Check-out (time out) endpoint.
pub const PATH_TIME_OUT: &str = "/api/attendance/time-out";

/// Paged recent visits endpoint.
pub const PATH_RECENT: &str = "/api/attendance/recent";

/// Per-student history endpoint prefix (`/api/students/{id}/history`).
pub const PATH_STUDENTS: &str = "/api/students";

// ============================================================================
// Live Feed
// ============================================================================

/// Default live feed polling interval, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 8;

/// Number of recent visits requested on each live feed poll.
pub const DEFAULT_FEED_LIMIT: u32 = 12;

/// Page size used when browsing recent visits.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
