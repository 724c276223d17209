//! Keystroke decoder for keyboard-emulating scanners.
//!
//! Barcode and QR scanners in keyboard-wedge mode "type" the code followed by
//! Enter, much faster than a person can. The decoder buffers characters and
//! emits the buffer on Enter. A pause longer than the gap threshold between
//! two characters means the buffer holds an abandoned fragment (someone
//! pressed a key by accident), so it is discarded before the new character is
//! appended.
//!
//! # State Machine
//!
//! ```text
//!                 Char (gap <= threshold)
//!                 ┌──────────┐
//!                 v          │
//! ┌───────┐  Char  ┌──────────────┐  Enter   ┌────────────┐
//! │ Empty │──────> │  Buffering   │────────> │ ScanCode   │
//! └───────┘        └──────────────┘          └────────────┘
//!     ^                 │  Char (gap > threshold):
//!     │                 │  fragment dropped, buffer restarts
//!     └─────────────────┘
//! ```
//!
//! Paste events bypass the buffer entirely and are emitted at once.
//!
//! # Example
//!
//! ```
//! use kiosk_scanner::{InputEvent, KeystrokeDecoder};
//! use std::time::Duration;
//! use tokio::time::Instant;
//!
//! let mut decoder = KeystrokeDecoder::new();
//! let t0 = Instant::now();
//!
//! assert!(decoder.feed(InputEvent::char('A').at(t0)).is_none());
//! assert!(decoder.feed(InputEvent::char('B').at(t0 + Duration::from_millis(20))).is_none());
//! let code = decoder.feed(InputEvent::enter().at(t0 + Duration::from_millis(40))).unwrap();
//! assert_eq!(code.as_str(), "AB");
//! ```

use std::fmt;
use std::time::Duration;

use kiosk_core::constants::{DEFAULT_SCAN_GAP_MS, MAX_SCAN_LENGTH};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::event::{InputEvent, Key};

/// A raw scan code emitted by the decoder.
///
/// Never empty. Not `Clone`: each scan is handed on exactly once and consumed
/// by [`canonicalize`](crate::canonicalize).
#[derive(Debug, PartialEq, Eq)]
pub struct ScanCode(String);

impl ScanCode {
    /// Wrap a raw code. Returns `None` for an empty string.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() { None } else { Some(Self(raw)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ScanCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Counters describing what the decoder has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Scan codes emitted, from Enter or paste.
    pub scans_emitted: u64,
    /// Partial buffers dropped because of a pause longer than the threshold.
    pub fragments_discarded: u64,
    /// Buffers dropped because they reached `MAX_SCAN_LENGTH` without Enter.
    pub overflows: u64,
}

/// Turns timed key and paste events into scan codes.
#[derive(Debug)]
pub struct KeystrokeDecoder {
    buffer: String,
    last_char_at: Option<Instant>,
    gap_threshold: Duration,
    stats: DecoderStats,
}

impl KeystrokeDecoder {
    /// Decoder with the default 500 ms gap threshold.
    pub fn new() -> Self {
        Self::with_gap_threshold(Duration::from_millis(DEFAULT_SCAN_GAP_MS))
    }

    pub fn with_gap_threshold(gap_threshold: Duration) -> Self {
        Self {
            buffer: String::with_capacity(64),
            last_char_at: None,
            gap_threshold,
            stats: DecoderStats::default(),
        }
    }

    /// Feed one event, returning a scan code when one completes.
    ///
    /// - Modifier-only and other named keys are ignored and do not touch the
    ///   timestamp.
    /// - A character arriving more than the gap threshold after the previous
    ///   one restarts the buffer.
    /// - Enter emits the trimmed buffer if it is non-empty, then resets.
    /// - Paste emits the trimmed text at once, leaving the buffer as is.
    pub fn feed(&mut self, event: InputEvent) -> Option<ScanCode> {
        match event {
            InputEvent::Key { key: Key::Char(c), at } => {
                self.push_char(c, at);
                None
            }
            InputEvent::Key { key: Key::Enter, .. } => self.complete(),
            InputEvent::Key { key, .. } => {
                trace!(%key, "Ignoring non-character key");
                None
            }
            InputEvent::Paste { text, .. } => {
                let code = ScanCode::new(text.trim());
                if code.is_some() {
                    self.stats.scans_emitted += 1;
                    debug!(len = text.len(), "Paste emitted as scan");
                }
                code
            }
        }
    }

    fn push_char(&mut self, c: char, at: Instant) {
        if let Some(last) = self.last_char_at
            && at.saturating_duration_since(last) > self.gap_threshold
            && !self.buffer.is_empty()
        {
            self.stats.fragments_discarded += 1;
            debug!(
                fragment_len = self.buffer.len(),
                gap_ms = at.saturating_duration_since(last).as_millis() as u64,
                "Discarding abandoned scan fragment"
            );
            self.buffer.clear();
        }

        if self.buffer.len() >= MAX_SCAN_LENGTH {
            self.stats.overflows += 1;
            warn!(max = MAX_SCAN_LENGTH, "Scan buffer overflow, discarding");
            self.buffer.clear();
        }

        self.buffer.push(c);
        self.last_char_at = Some(at);
    }

    fn complete(&mut self) -> Option<ScanCode> {
        let code = ScanCode::new(self.buffer.trim());
        self.reset();
        if let Some(code) = &code {
            self.stats.scans_emitted += 1;
            debug!(len = code.len(), "Scan completed");
        }
        code
    }

    /// Drop any buffered characters.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_char_at = None;
    }

    /// Number of characters currently buffered.
    pub fn pending_len(&self) -> usize {
        self.buffer.chars().count()
    }

    pub fn gap_threshold(&self) -> Duration {
        self.gap_threshold
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }
}

impl Default for KeystrokeDecoder {
    fn default() -> Self {
        Self::new()
    }
}
