//! Input event sources.
//!
//! An [`InputSource`] yields timed [`InputEvent`]s for the keystroke decoder.
//! Two implementations exist:
//!
//! - [`TerminalSource`] reads `crossterm` key and paste events from a raw-mode
//!   terminal with a keyboard-emulating scanner attached.
//! - [`SyntheticSource`] is fed through a [`SyntheticSourceHandle`] and is
//!   used for tests and demos where timing must be deterministic.
//!
//! Traits use native `async fn` (Edition 2024), no `async_trait` needed.

#![allow(async_fn_in_trait)]

mod synthetic;
mod terminal;

pub use synthetic::{SyntheticSource, SyntheticSourceHandle};
pub use terminal::TerminalSource;

use crate::decoder::{KeystrokeDecoder, ScanCode};
use crate::error::Result;
use crate::event::InputEvent;

/// A producer of input events.
pub trait InputSource {
    /// Wait for the next event.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Disconnected`](crate::SourceError::Disconnected)
    /// once the source is exhausted, or an I/O error from the underlying
    /// reader.
    async fn next_event(&mut self) -> Result<InputEvent>;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

/// Read events from `source` until the decoder completes a scan.
///
/// # Errors
///
/// Propagates the first error returned by the source.
pub async fn next_scan<S: InputSource>(
    source: &mut S,
    decoder: &mut KeystrokeDecoder,
) -> Result<ScanCode> {
    loop {
        let event = source.next_event().await?;
        if let Some(code) = decoder.feed(event) {
            return Ok(code);
        }
    }
}
