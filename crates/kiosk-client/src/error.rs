//! Errors raised by the HTTP attendance client.

use thiserror::Error;

/// Errors that can occur while talking to the attendance service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured base URL cannot be used.
    #[error("Invalid service URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request did not complete within the configured timeout.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Connection or protocol failure below HTTP status level.
    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body is not the expected JSON.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status code, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ClientError> for kiosk_core::Error {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Decode(message) => kiosk_core::Error::MalformedResponse(message),
            ClientError::InvalidUrl { url, reason } => {
                kiosk_core::Error::Config(format!("invalid service URL '{url}': {reason}"))
            }
            other => kiosk_core::Error::Service(other.to_string()),
        }
    }
}
