//! # alice-core
//!
//! Core types for the alice agent client.
//!
//! - **Messages**: user prompts and streamed bot replies
//! - **Transcript**: the append-only, copy-on-write conversation log
//! - **Status**: the independently refreshed task/skill/output resources
//! - **Identifiers**: type-safe IDs for messages and turns
//!
//! ## Example
//!
//! ```rust
//! use alice_core::{MessageStatus, Transcript};
//!
//! let mut transcript = Transcript::new();
//! transcript.begin_turn("What's the weather?").unwrap();
//!
//! if let Some(bot) = transcript.active_mut() {
//!     bot.push_content("Sunny.");
//! }
//! transcript.finish_active(MessageStatus::Completed).unwrap();
//!
//! assert_eq!(transcript.last().unwrap().content(), "Sunny.");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod errors;
pub mod identifier;
pub mod messages;
pub mod status;
pub mod transcript;

pub use errors::{Result, TranscriptError};
pub use identifier::{now_utc, MessageId, TurnId};
pub use messages::{Message, MessageStatus, Role};
pub use status::{
    MemorySnapshot, OutputFile, Resource, ResourceKind, SkillInfo, SkillRegistry, StatusSnapshot,
};
pub use transcript::Transcript;

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::errors::{Result, TranscriptError};
    pub use crate::identifier::{MessageId, TurnId};
    pub use crate::messages::{Message, MessageStatus, Role};
    pub use crate::status::{OutputFile, ResourceKind, SkillInfo, StatusSnapshot};
    pub use crate::transcript::Transcript;
}
