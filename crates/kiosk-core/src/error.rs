use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Scan pipeline errors
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Input source disconnected: {0}")]
    Disconnected(String),

    // Session errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Operation rejected in state {state}: {reason}")]
    Rejected { state: String, reason: String },

    // Remote service errors
    #[error("Attendance service error: {0}")]
    Service(String),

    #[error("Malformed service response: {0}")]
    MalformedResponse(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => Error::MissingConfig(key),
            other => Error::Config(other.to_string()),
        }
    }
}
