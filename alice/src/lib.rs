//! # alice
//!
//! Rust client for the alice agent backend: send chat messages, watch the
//! reply stream into a live transcript, and keep the agent's tasks, skills,
//! and output files in view.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use alice::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     alice::init_tracing();
//!
//!     let client = AliceClient::from_env()?;
//!     let _status = client.start_status_sync();
//!
//!     let outcome = client.send("What is on the task list?").await?;
//!     if let Some(reply) = outcome.reply() {
//!         println!("{}", reply.content());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`alice_core`] - Messages, the transcript, and status resources
//! - [`alice_streaming`] - NDJSON framing, delta decoding, and reduction
//! - [`alice_client`] - HTTP backend, chat session, and status poller
//!
//! ## Configuration
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `ALICE_BASE_URL` | Backend base URL | `http://localhost:8000` |
//! | `ALICE_POLL_INTERVAL_SECS` | Status polling period | `5` |
//! | `ALICE_REQUEST_TIMEOUT_SECS` | Status request timeout | `10` |
//! | `RUST_LOG` | Log filter | `alice=info` |

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod telemetry;

pub use alice_client as client;
pub use alice_core as core;
pub use alice_streaming as streaming;

pub use telemetry::{init_json_tracing, init_tracing, init_tracing_with_filter};

pub use alice_client::{
    AgentBackend, AliceClient, ClientConfig, ClientError, ClientResult, HttpBackend,
    SessionError, SessionEvent, StatusSync, StatusSyncHandle, StreamSession, TurnOutcome,
    TurnPhase,
};
pub use alice_core::{
    Message, MessageStatus, OutputFile, ResourceKind, Role, StatusSnapshot, Transcript,
};
pub use alice_streaming::{DecodeIssue, Delta};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        AliceClient, ClientConfig, ClientError, DecodeIssue, Message, MessageStatus, OutputFile,
        ResourceKind, Role, SessionError, SessionEvent, StatusSnapshot, StatusSync,
        StreamSession, Transcript, TurnOutcome, TurnPhase,
    };
}
