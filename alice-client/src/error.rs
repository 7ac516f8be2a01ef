//! Client error types.

use alice_streaming::StreamError;
use thiserror::Error;

/// Errors from talking to the agent backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-success HTTP status.
    #[error("HTTP error {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Could not reach the backend.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The response body could not be read or decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Framing or reducing the chat stream failed.
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The operation was cancelled.
    #[error("Cancelled")]
    Cancelled,

    /// Any other transport failure.
    #[error("Network error: {0}")]
    Network(String),
}

impl ClientError {
    /// Create an HTTP error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Check if retrying the same request could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Connection(_) | Self::Network(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Get the HTTP status code if this is an HTTP error.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_connect() {
            ClientError::Connection(err.to_string())
        } else if err.is_decode() || err.is_body() {
            ClientError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::http(status.as_u16(), err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

/// Result type for backend operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Why a chat submission was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A turn is already submitting or streaming.
    #[error("A turn is already in flight")]
    TurnInFlight,

    /// The message was empty or whitespace only.
    #[error("Message is empty")]
    EmptyMessage,
}
