//! Folding deltas into the transcript.
//!
//! [`reduce`] is pure: it returns a new [`Transcript`] and leaves its input
//! untouched, so every published snapshot stays consistent. Only the active
//! bot message is copied; earlier messages are shared with the input.

use crate::delta::Delta;
use crate::error::StreamResult;
use alice_core::{Transcript, TranscriptError};

/// Apply one delta, returning the updated transcript.
///
/// [`Delta::Unknown`] is a no-op. Any other delta requires an active bot
/// message.
pub fn reduce(transcript: &Transcript, delta: &Delta) -> StreamResult<Transcript> {
    let mut next = transcript.clone();
    apply(&mut next, delta)?;
    Ok(next)
}

/// Apply a sequence of deltas in order.
pub fn reduce_all<'a, I>(transcript: &Transcript, deltas: I) -> StreamResult<Transcript>
where
    I: IntoIterator<Item = &'a Delta>,
{
    let mut next = transcript.clone();
    for delta in deltas {
        apply(&mut next, delta)?;
    }
    Ok(next)
}

fn apply(transcript: &mut Transcript, delta: &Delta) -> StreamResult<()> {
    if delta.is_unknown() {
        return Ok(());
    }

    let active = transcript
        .active_mut()
        .ok_or(TranscriptError::NoActiveMessage)?;

    match delta {
        Delta::Thinking { text } => active.push_thinking(text),
        Delta::Content { text } => active.push_content(text),
        Delta::ExecutionResult { text } => active.push_execution_result(text.as_str()),
        Delta::System { text } => active.push_notice(text.as_str()),
        Delta::Unknown { .. } => {}
    }

    Ok(())
}
