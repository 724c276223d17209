//! Error types for scanner input sources.

/// Result type alias for input source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors raised while reading input events.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source ended or its channel closed.
    #[error("Input source disconnected: {source_name}")]
    Disconnected { source_name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    pub fn disconnected(source_name: impl Into<String>) -> Self {
        Self::Disconnected {
            source_name: source_name.into(),
        }
    }

    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected { .. })
    }
}

impl From<SourceError> for kiosk_core::Error {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Disconnected { source_name } => kiosk_core::Error::Disconnected(source_name),
            SourceError::Io(e) => kiosk_core::Error::Io(e),
        }
    }
}
