//! Input events delivered by scanner sources.

use std::fmt;
use tokio::time::Instant;

/// Modifier keys, which never contribute characters to a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Shift,
    Control,
    Alt,
    Meta,
    CapsLock,
}

/// A single key press as reported by an input source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// Enter or Return, which terminates a scan.
    Enter,
    /// A modifier-only key press.
    Modifier(Modifier),
    /// Any other named key (Tab, arrows, function keys, unknown escapes).
    Other(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{c}"),
            Key::Enter => write!(f, "Enter"),
            Key::Modifier(m) => write!(f, "{m:?}"),
            Key::Other(name) => write!(f, "{name}"),
        }
    }
}

/// An event consumed by the keystroke decoder.
///
/// Every event carries the instant it was observed; the decoder uses it to
/// tell a scanner burst from slow manual typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key { key: Key, at: Instant },
    /// A pasted block of text, delivered as a whole.
    Paste { text: String, at: Instant },
}

impl InputEvent {
    /// A key event stamped with the current instant.
    pub fn key(key: Key) -> Self {
        Self::Key {
            key,
            at: Instant::now(),
        }
    }

    /// A character key event stamped with the current instant.
    pub fn char(c: char) -> Self {
        Self::key(Key::Char(c))
    }

    /// An Enter event stamped with the current instant.
    pub fn enter() -> Self {
        Self::key(Key::Enter)
    }

    /// A paste event stamped with the current instant.
    pub fn paste(text: impl Into<String>) -> Self {
        Self::Paste {
            text: text.into(),
            at: Instant::now(),
        }
    }

    /// Replace the timestamp, for deterministic replays.
    #[must_use]
    pub fn at(self, at: Instant) -> Self {
        match self {
            Self::Key { key, .. } => Self::Key { key, at },
            Self::Paste { text, .. } => Self::Paste { text, at },
        }
    }

    pub fn timestamp(&self) -> Instant {
        match self {
            Self::Key { at, .. } | Self::Paste { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_at_replaces_timestamp() {
        let base = Instant::now();
        let later = base + Duration::from_millis(40);

        let event = InputEvent::char('A').at(later);
        assert_eq!(event.timestamp(), later);

        let paste = InputEvent::paste("X").at(base);
        assert_eq!(paste.timestamp(), base);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(Key::Char('7').to_string(), "7");
        assert_eq!(Key::Enter.to_string(), "Enter");
        assert_eq!(Key::Modifier(Modifier::Shift).to_string(), "Shift");
        assert_eq!(Key::Other("Tab".into()).to_string(), "Tab");
    }
}
