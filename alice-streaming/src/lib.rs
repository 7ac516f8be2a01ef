//! # alice-streaming
//!
//! Stream ingestion for the alice agent client.
//!
//! The chat endpoint answers with a chunked body of newline-delimited JSON
//! events. This crate turns those bytes into transcript updates in three
//! steps:
//!
//! - **[`LineFramer`] / [`NdjsonStream`]**: split arbitrary chunks into
//!   complete records, buffering partial records across reads
//! - **[`interpret`]**: decode a record into a typed [`Delta`], falling back
//!   to [`Delta::Unknown`] instead of failing
//! - **[`reduce`]**: fold a delta into a new [`Transcript`](alice_core::Transcript)
//!   snapshot
//!
//! ## Example
//!
//! ```rust
//! use alice_core::Transcript;
//! use alice_streaming::{interpret, reduce, LineFramer};
//!
//! let mut framer = LineFramer::new();
//! framer.feed(br#"{"type":"content","delta":"Hel"#).unwrap();
//! framer.feed(b"lo\"}\n").unwrap();
//!
//! let mut transcript = Transcript::new();
//! transcript.begin_turn("hi").unwrap();
//!
//! while let Some(record) = framer.next_record() {
//!     transcript = reduce(&transcript, &interpret(&record)).unwrap();
//! }
//!
//! assert_eq!(transcript.last().unwrap().content(), "Hello");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod delta;
pub mod error;
pub mod framer;
pub mod reducer;

// Re-exports
pub use delta::{interpret, DecodeIssue, Delta};
pub use error::{StreamError, StreamResult};
pub use framer::{LineFramer, NdjsonStream, NdjsonStreamExt, DEFAULT_MAX_RECORD_BYTES};
pub use reducer::{reduce, reduce_all};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        interpret, reduce, DecodeIssue, Delta, LineFramer, NdjsonStream, NdjsonStreamExt,
        StreamError, StreamResult,
    };
}
