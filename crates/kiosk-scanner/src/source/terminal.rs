//! Input source over terminal key events.
//!
//! Keyboard-wedge scanners show up as ordinary keystrokes. With the terminal
//! in raw mode and bracketed paste enabled, `crossterm` reports every key
//! press as its own event, so each one can be stamped on arrival and the
//! decoder's gap rule sees real inter-key timing.
//!
//! Event mapping:
//!
//! ```text
//! Key(Enter)                    -> Key::Enter
//! Key(Char c)                   -> Key::Char(c)
//! Key(Char c) + Ctrl/Alt        -> Key::Other("Ctrl-c" / "Alt-c")
//! Key(Ctrl-C) / Key(Ctrl-D)     -> disconnected
//! Key(Modifier) / Key(CapsLock) -> Key::Modifier
//! other keys                    -> Key::Other
//! Paste(text)                   -> InputEvent::Paste
//! key releases, mouse, resize   -> skipped
//! ```

use std::io;

use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode,
};
use futures::{Stream, StreamExt};
use tokio::time::Instant;
use tracing::{debug, info, trace};

use super::InputSource;
use crate::error::{Result, SourceError};
use crate::event::{InputEvent, Key, Modifier};

/// Input source over a stream of terminal events.
///
/// The caller owns terminal modes: raw mode and bracketed paste must be
/// enabled for key timing and paste events to be meaningful.
/// `next_event` is cancel-safe.
#[derive(Debug)]
pub struct TerminalSource<S = EventStream> {
    events: S,
    name: String,
}

impl TerminalSource<EventStream> {
    /// Read key events from the controlling terminal.
    pub fn new() -> Self {
        Self::from_stream(EventStream::new(), "terminal")
    }
}

impl Default for TerminalSource<EventStream> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> TerminalSource<S>
where
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    /// Wrap any stream of terminal events.
    pub fn from_stream(events: S, name: impl Into<String>) -> Self {
        Self {
            events,
            name: name.into(),
        }
    }
}

impl<S> InputSource for TerminalSource<S>
where
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    async fn next_event(&mut self) -> Result<InputEvent> {
        while let Some(event) = self.events.next().await {
            let at = Instant::now();
            match event? {
                Event::Key(key) if key.kind == KeyEventKind::Release => {}
                Event::Key(key) if is_interrupt(&key) => {
                    info!(source = %self.name, "Interrupt key pressed");
                    return Err(SourceError::disconnected(self.name.clone()));
                }
                Event::Key(key) => {
                    return Ok(InputEvent::Key {
                        key: translate(key),
                        at,
                    });
                }
                Event::Paste(text) => {
                    debug!(len = text.len(), "Bracketed paste received");
                    return Ok(InputEvent::Paste { text, at });
                }
                other => trace!(event = ?other, "Skipping terminal event"),
            }
        }
        Err(SourceError::disconnected(self.name.clone()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Raw mode turns Ctrl-C into a key press instead of a signal.
fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c' | 'C' | 'd' | 'D'))
}

fn translate(key: KeyEvent) -> Key {
    match key.code {
        KeyCode::Enter => Key::Enter,
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Key::Other(format!("Ctrl-{c}"))
        }
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::ALT) => {
            Key::Other(format!("Alt-{c}"))
        }
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::CapsLock => Key::Modifier(Modifier::CapsLock),
        KeyCode::Modifier(modifier) => Key::Modifier(match modifier {
            ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => Modifier::Shift,
            ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => Modifier::Control,
            ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => Modifier::Alt,
            _ => Modifier::Meta,
        }),
        other => Key::Other(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use std::time::Duration;

    type EventSender = mpsc::UnboundedSender<io::Result<Event>>;

    fn source() -> (TerminalSource<mpsc::UnboundedReceiver<io::Result<Event>>>, EventSender) {
        let (tx, rx) = mpsc::unbounded();
        (TerminalSource::from_stream(rx, "test-terminal"), tx)
    }

    fn press(tx: &EventSender, code: KeyCode) {
        tx.unbounded_send(Ok(Event::Key(KeyEvent::new(code, KeyModifiers::NONE))))
            .unwrap();
    }

    async fn next_key(source: &mut TerminalSource<mpsc::UnboundedReceiver<io::Result<Event>>>) -> Key {
        match source.next_event().await.unwrap() {
            InputEvent::Key { key, .. } => key,
            other => panic!("expected key, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_chars_and_enter() {
        let (mut source, tx) = source();
        for code in [KeyCode::Char('A'), KeyCode::Char('1'), KeyCode::Enter] {
            press(&tx, code);
        }

        assert_eq!(next_key(&mut source).await, Key::Char('A'));
        assert_eq!(next_key(&mut source).await, Key::Char('1'));
        assert_eq!(next_key(&mut source).await, Key::Enter);
    }

    #[tokio::test]
    async fn test_paste_event() {
        let (mut source, tx) = source();
        tx.unbounded_send(Ok(Event::Paste(" 2023-0099 ".to_string())))
            .unwrap();

        match source.next_event().await.unwrap() {
            InputEvent::Paste { text, .. } => assert_eq!(text, " 2023-0099 "),
            other => panic!("expected paste, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_named_and_modified_keys() {
        let (mut source, tx) = source();
        press(&tx, KeyCode::Tab);
        press(&tx, KeyCode::Up);
        press(&tx, KeyCode::Modifier(ModifierKeyCode::LeftShift));
        tx.unbounded_send(Ok(Event::Key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT))))
            .unwrap();

        assert_eq!(next_key(&mut source).await, Key::Other("Tab".to_string()));
        assert_eq!(next_key(&mut source).await, Key::Other("Up".to_string()));
        assert_eq!(next_key(&mut source).await, Key::Modifier(Modifier::Shift));
        assert_eq!(next_key(&mut source).await, Key::Other("Alt-x".to_string()));
    }

    #[tokio::test]
    async fn test_releases_and_resizes_are_skipped() {
        let (mut source, tx) = source();
        let mut release = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        tx.unbounded_send(Ok(Event::Key(release))).unwrap();
        tx.unbounded_send(Ok(Event::Resize(80, 24))).unwrap();
        press(&tx, KeyCode::Char('7'));

        assert_eq!(next_key(&mut source).await, Key::Char('7'));
    }

    #[tokio::test]
    async fn test_ctrl_c_disconnects() {
        let (mut source, tx) = source();
        tx.unbounded_send(Ok(Event::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        ))))
        .unwrap();

        let err = source.next_event().await.unwrap_err();
        assert!(err.is_disconnected());
    }

    #[tokio::test]
    async fn test_end_of_stream_disconnects() {
        let (mut source, tx) = source();
        drop(tx);
        let err = source.next_event().await.unwrap_err();
        assert_eq!(err.to_string(), "Input source disconnected: test-terminal");
    }

    #[tokio::test]
    async fn test_read_error_is_io() {
        let (mut source, tx) = source();
        tx.unbounded_send(Err(io::Error::other("tty gone"))).unwrap();
        let err = source.next_event().await.unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_stamped_on_arrival() {
        let (mut source, tx) = source();

        press(&tx, KeyCode::Char('A'));
        let first = source.next_event().await.unwrap();
        tokio::time::advance(Duration::from_millis(600)).await;
        press(&tx, KeyCode::Char('B'));
        let second = source.next_event().await.unwrap();

        assert_eq!(
            second.timestamp() - first.timestamp(),
            Duration::from_millis(600)
        );
    }
}
