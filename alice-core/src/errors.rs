//! Core error types.

use thiserror::Error;

/// Errors raised when a transcript operation would break its lifecycle rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    /// A new turn was started while the previous bot message is still mutable.
    #[error("a turn is already in progress")]
    ActiveTurnInProgress,

    /// A delta or terminal transition was applied with no active bot message.
    #[error("no active bot message to update")]
    NoActiveMessage,
}

/// Result type alias for transcript operations.
pub type Result<T> = std::result::Result<T, TranscriptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            TranscriptError::ActiveTurnInProgress.to_string(),
            "a turn is already in progress"
        );
        assert_eq!(
            TranscriptError::NoActiveMessage.to_string(),
            "no active bot message to update"
        );
    }
}
