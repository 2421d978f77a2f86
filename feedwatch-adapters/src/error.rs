//! Error types for feed clients.

use thiserror::Error;

/// Errors that can occur when fetching readings from a feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The request never produced a response (DNS, connect, reset, ...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The service rejected the credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The response did not have the expected shape.
    #[error("Unexpected response format: {0}")]
    Format(String),

    /// The client could not be constructed.
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl FeedError {
    /// True for failures where no response was received at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, FeedError::Transport(_) | FeedError::Timeout)
    }
}

#[cfg(feature = "adafruit")]
impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout
        } else if err.is_decode() {
            FeedError::Format(err.to_string())
        } else {
            FeedError::Transport(err.to_string())
        }
    }
}
