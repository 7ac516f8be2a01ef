//! Decoding of framed records into typed deltas.
//!
//! Each record is a JSON object with a `type` tag. Known tags map onto
//! [`Delta`] variants; anything else, including malformed JSON, becomes
//! [`Delta::Unknown`] so one bad record never ends the turn.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// One incremental update to the active bot message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Delta {
    /// Reasoning text to append.
    Thinking {
        /// Text fragment.
        text: String,
    },
    /// Answer text to append.
    Content {
        /// Text fragment.
        text: String,
    },
    /// One complete execution result entry.
    ExecutionResult {
        /// Result text.
        text: String,
    },
    /// A backend progress notice.
    System {
        /// Notice text.
        text: String,
    },
    /// A record that could not be decoded.
    Unknown {
        /// The record as received.
        raw: String,
        /// Why decoding failed.
        issue: DecodeIssue,
    },
}

impl Delta {
    /// Create a thinking delta.
    pub fn thinking(text: impl Into<String>) -> Self {
        Self::Thinking { text: text.into() }
    }

    /// Create a content delta.
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content { text: text.into() }
    }

    /// Create an execution result delta.
    pub fn execution_result(text: impl Into<String>) -> Self {
        Self::ExecutionResult { text: text.into() }
    }

    /// Create a system notice delta.
    pub fn system(text: impl Into<String>) -> Self {
        Self::System { text: text.into() }
    }

    /// Wire name of the delta kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Thinking { .. } => "thinking",
            Self::Content { .. } => "content",
            Self::ExecutionResult { .. } => "execution_result",
            Self::System { .. } => "system",
            Self::Unknown { .. } => "unknown",
        }
    }

    /// Check if this record failed to decode.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }
}

/// Reason a record decoded to [`Delta::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodeIssue {
    /// Not valid JSON.
    Malformed {
        /// Parser message.
        message: String,
    },
    /// Valid JSON but not an object with a string `type`.
    MissingType,
    /// A `type` tag this client does not understand.
    UnrecognizedType {
        /// The tag value.
        tag: String,
    },
    /// A known tag without its string payload field.
    MissingPayload {
        /// The tag value.
        tag: String,
        /// The expected payload field.
        field: String,
    },
}

impl fmt::Display for DecodeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { message } => write!(f, "malformed JSON: {message}"),
            Self::MissingType => f.write_str("missing string `type` field"),
            Self::UnrecognizedType { tag } => write!(f, "unrecognized event type `{tag}`"),
            Self::MissingPayload { tag, field } => {
                write!(f, "`{tag}` event without string `{field}` field")
            }
        }
    }
}

/// Decode one framed record.
///
/// Never fails: undecodable records come back as [`Delta::Unknown`] and a
/// warning is logged.
pub fn interpret(record: &str) -> Delta {
    match decode(record) {
        Ok(delta) => delta,
        Err(issue) => {
            tracing::warn!(%issue, record, "Skipping undecodable stream event");
            Delta::Unknown {
                raw: record.to_owned(),
                issue,
            }
        }
    }
}

fn decode(record: &str) -> Result<Delta, DecodeIssue> {
    let value: JsonValue = serde_json::from_str(record).map_err(|e| DecodeIssue::Malformed {
        message: e.to_string(),
    })?;

    let tag = value
        .get("type")
        .and_then(JsonValue::as_str)
        .ok_or(DecodeIssue::MissingType)?;

    match tag {
        "thinking" => payload(&value, tag, "delta").map(|text| Delta::Thinking { text }),
        "content" => payload(&value, tag, "delta").map(|text| Delta::Content { text }),
        "execution_result" => {
            payload(&value, tag, "content").map(|text| Delta::ExecutionResult { text })
        }
        "system" => payload(&value, tag, "content").map(|text| Delta::System { text }),
        other => Err(DecodeIssue::UnrecognizedType {
            tag: other.to_owned(),
        }),
    }
}

fn payload(value: &JsonValue, tag: &str, field: &str) -> Result<String, DecodeIssue> {
    value
        .get(field)
        .and_then(JsonValue::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| DecodeIssue::MissingPayload {
            tag: tag.to_owned(),
            field: field.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"type":"thinking","delta":"hmm"}"#, Delta::thinking("hmm"))]
    #[case(r#"{"type":"content","delta":"Hello"}"#, Delta::content("Hello"))]
    #[case(r#"{"type":"execution_result","content":"42"}"#, Delta::execution_result("42"))]
    #[case(r#"{"type":"system","content":"running code"}"#, Delta::system("running code"))]
    #[case(r#"{"delta":"x","type":"content","extra":1}"#, Delta::content("x"))]
    #[case(r#"{"type":"content","delta":""}"#, Delta::content(""))]
    fn test_known_events(#[case] record: &str, #[case] expected: Delta) {
        assert_eq!(interpret(record), expected);
    }

    #[test]
    fn test_malformed_json() {
        let delta = interpret(r#"{"type":"content","delta":"#);
        match delta {
            Delta::Unknown { raw, issue } => {
                assert_eq!(raw, r#"{"type":"content","delta":"#);
                assert!(matches!(issue, DecodeIssue::Malformed { .. }));
            }
            other => panic!("expected unknown, got {other:?}"),
        }
    }

    #[rstest]
    #[case(r#"["content"]"#, DecodeIssue::MissingType)]
    #[case(r#"{"delta":"x"}"#, DecodeIssue::MissingType)]
    #[case(r#"{"type":7,"delta":"x"}"#, DecodeIssue::MissingType)]
    #[case(
        r#"{"type":"tool_call","name":"x"}"#,
        DecodeIssue::UnrecognizedType { tag: "tool_call".into() }
    )]
    #[case(
        r#"{"type":"content","content":"x"}"#,
        DecodeIssue::MissingPayload { tag: "content".into(), field: "delta".into() }
    )]
    #[case(
        r#"{"type":"execution_result","content":null}"#,
        DecodeIssue::MissingPayload { tag: "execution_result".into(), field: "content".into() }
    )]
    fn test_undecodable_events(#[case] record: &str, #[case] expected: DecodeIssue) {
        match interpret(record) {
            Delta::Unknown { issue, .. } => assert_eq!(issue, expected),
            other => panic!("expected unknown, got {other:?}"),
        }
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Delta::content("x").kind(), "content");
        assert_eq!(Delta::execution_result("x").kind(), "execution_result");
        assert!(interpret("nope").is_unknown());
    }

    #[test]
    fn test_issue_display() {
        let issue = DecodeIssue::UnrecognizedType { tag: "ping".into() };
        assert_eq!(issue.to_string(), "unrecognized event type `ping`");
    }
}
