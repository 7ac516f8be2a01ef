//! Streaming errors.

use alice_core::TranscriptError;
use thiserror::Error;

/// Errors that can occur while framing or reducing a stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// A single unterminated record grew past the configured limit.
    #[error("Pending record exceeds {limit} bytes without a delimiter")]
    BufferOverflow {
        /// Configured maximum record size.
        limit: usize,
    },

    /// A delta could not be applied to the transcript.
    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StreamError::BufferOverflow { limit: 16 };
        assert_eq!(
            err.to_string(),
            "Pending record exceeds 16 bytes without a delimiter"
        );
    }

    #[test]
    fn test_from_transcript_error() {
        let err: StreamError = TranscriptError::NoActiveMessage.into();
        assert!(matches!(err, StreamError::Transcript(_)));
    }
}
