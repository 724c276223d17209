//! Channel-fed input source for tests and demos.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::InputSource;
use crate::error::{Result, SourceError};
use crate::event::{InputEvent, Key};

const CHANNEL_CAPACITY: usize = 256;

/// Input source driven programmatically through a [`SyntheticSourceHandle`].
///
/// Events keep whatever timestamps the sender gave them, so decoder timing
/// can be replayed exactly.
///
/// # Examples
///
/// ```
/// use kiosk_scanner::{InputEvent, InputSource, SyntheticSource};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> kiosk_scanner::Result<()> {
///     let (mut source, handle) = SyntheticSource::new();
///
///     handle.send(InputEvent::char('7')).await?;
///     handle.send(InputEvent::enter()).await?;
///
///     assert!(matches!(source.next_event().await?, InputEvent::Key { .. }));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct SyntheticSource {
    rx: mpsc::Receiver<InputEvent>,
    name: String,
}

impl SyntheticSource {
    pub fn new() -> (Self, SyntheticSourceHandle) {
        Self::with_name("synthetic")
    }

    pub fn with_name(name: impl Into<String>) -> (Self, SyntheticSourceHandle) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let name = name.into();
        let source = Self {
            rx,
            name: name.clone(),
        };
        (source, SyntheticSourceHandle { tx, name })
    }
}

impl InputSource for SyntheticSource {
    async fn next_event(&mut self) -> Result<InputEvent> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| SourceError::disconnected(self.name.clone()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Sender side of a [`SyntheticSource`]. Cheap to clone.
///
/// Dropping every handle disconnects the source.
#[derive(Debug, Clone)]
pub struct SyntheticSourceHandle {
    tx: mpsc::Sender<InputEvent>,
    name: String,
}

impl SyntheticSourceHandle {
    /// Send one event.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Disconnected` if the source has been dropped.
    pub async fn send(&self, event: InputEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| SourceError::disconnected(self.name.clone()))
    }

    /// Type `text` as individual key events spaced `step` apart starting at
    /// `start`, then press Enter one `step` after the last character.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Disconnected` if the source has been dropped.
    pub async fn type_scan(&self, text: &str, start: Instant, step: Duration) -> Result<()> {
        let mut at = start;
        for c in text.chars() {
            self.send(InputEvent::key(Key::Char(c)).at(at)).await?;
            at += step;
        }
        self.send(InputEvent::enter().at(at)).await
    }

    /// Type `text` as a scanner would: 5 ms between keys, stamped now.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Disconnected` if the source has been dropped.
    pub async fn scan(&self, text: &str) -> Result<()> {
        self.type_scan(text, Instant::now(), Duration::from_millis(5))
            .await
    }

    /// Deliver `text` as a single paste event.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Disconnected` if the source has been dropped.
    pub async fn paste(&self, text: impl Into<String>) -> Result<()> {
        self.send(InputEvent::paste(text)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (mut source, handle) = SyntheticSource::new();
        handle.scan("AB").await.unwrap();

        assert!(matches!(
            source.next_event().await.unwrap(),
            InputEvent::Key { key: Key::Char('A'), .. }
        ));
        assert!(matches!(
            source.next_event().await.unwrap(),
            InputEvent::Key { key: Key::Char('B'), .. }
        ));
        assert!(matches!(
            source.next_event().await.unwrap(),
            InputEvent::Key { key: Key::Enter, .. }
        ));
    }

    #[tokio::test]
    async fn test_dropping_handle_disconnects() {
        let (mut source, handle) = SyntheticSource::with_name("test-scanner");
        drop(handle);

        let err = source.next_event().await.unwrap_err();
        assert!(err.is_disconnected());
        assert_eq!(source.name(), "test-scanner");
    }

    #[tokio::test]
    async fn test_send_after_source_dropped_fails() {
        let (source, handle) = SyntheticSource::new();
        drop(source);
        assert!(handle.paste("X").await.is_err());
    }
}
