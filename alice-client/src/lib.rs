//! # alice-client
//!
//! Client for the alice agent backend.
//!
//! - **[`StreamSession`]**: sends chat messages and folds the streamed reply
//!   into a live [`Transcript`](alice_core::Transcript)
//! - **[`StatusSync`]**: polls tasks, skills, and outputs in the background
//! - **[`AliceClient`]**: both of the above wired to one backend
//! - **[`AgentBackend`]**: the transport seam, with [`HttpBackend`] for the
//!   real server
//!
//! Configuration comes from [`ClientConfig`], optionally read from
//! `ALICE_*` environment variables.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod status;
pub mod types;

// Re-exports
pub use backend::{AgentBackend, ByteStream, HttpBackend};
pub use client::AliceClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, SessionError};
pub use session::{SessionEvent, SessionOptions, StreamSession, TurnOutcome, TurnPhase};
pub use status::{StatusSync, StatusSyncHandle, StatusTrigger};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        AgentBackend, AliceClient, ClientConfig, ClientError, ClientResult, SessionError,
        SessionEvent, StatusSync, StreamSession, TurnOutcome, TurnPhase,
    };
}
