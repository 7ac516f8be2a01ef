//! The chat session.
//!
//! A [`StreamSession`] owns the transcript and runs at most one turn at a
//! time. A turn appends the user message and an empty bot placeholder,
//! opens the chat stream, and folds every decoded delta into a fresh
//! transcript snapshot that is published through a `watch` channel.
//!
//! Phases move `Idle -> Submitting -> Streaming -> Completed | Failed`.
//! `Streaming` starts with the first body chunk; a turn whose body is empty
//! goes straight from `Submitting` to `Completed`. New submissions are
//! accepted in every phase except `Submitting` and `Streaming`.

use crate::backend::AgentBackend;
use crate::error::{ClientError, ClientResult, SessionError};
use crate::status::StatusTrigger;
use alice_core::{Message, MessageId, MessageStatus, Transcript, TranscriptError, TurnId};
use alice_streaming::{
    interpret, reduce, DecodeIssue, Delta, LineFramer, NdjsonStream, DEFAULT_MAX_RECORD_BYTES,
};
use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

/// Where the session is in its turn lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    /// No turn has run yet.
    #[default]
    Idle,
    /// The request is being sent; no body bytes yet.
    Submitting,
    /// Body bytes are arriving.
    Streaming,
    /// The last turn's stream ended cleanly.
    Completed,
    /// The last turn ended early.
    Failed,
}

impl TurnPhase {
    /// Whether a turn is running.
    #[must_use]
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Submitting | Self::Streaming)
    }
}

/// Lifecycle notifications for one session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A submission was accepted and the placeholder appended.
    TurnStarted {
        /// The turn.
        turn: TurnId,
        /// ID of the bot placeholder message.
        message_id: MessageId,
    },
    /// The first body chunk arrived.
    StreamOpened {
        /// The turn.
        turn: TurnId,
    },
    /// A record could not be decoded and was skipped.
    DecodeWarning {
        /// The turn.
        turn: TurnId,
        /// The record as received.
        raw: String,
        /// Why it was skipped.
        issue: DecodeIssue,
    },
    /// The stream ended cleanly.
    TurnCompleted {
        /// The turn.
        turn: TurnId,
    },
    /// The turn ended early.
    TurnFailed {
        /// The turn.
        turn: TurnId,
        /// Failure reason, also stored on the bot message.
        reason: String,
    },
}

/// Result of a finished turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The turn.
    pub turn: TurnId,
    /// Final status of the bot message.
    pub status: MessageStatus,
    /// Transcript snapshot right after the turn finished.
    pub transcript: Transcript,
    /// Records skipped because they could not be decoded.
    pub decode_warnings: usize,
}

impl TurnOutcome {
    /// The finished bot message.
    pub fn reply(&self) -> Option<&Message> {
        self.transcript.last()
    }

    /// Whether the stream ended cleanly.
    pub fn is_completed(&self) -> bool {
        self.status == MessageStatus::Completed
    }
}

/// Options for [`StreamSession::with_options`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Largest single stream record accepted.
    pub max_record_bytes: usize,
    /// Buffered events per subscriber.
    pub event_capacity: usize,
    /// Fired after every finished turn.
    pub status_trigger: Option<StatusTrigger>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            event_capacity: crate::config::DEFAULT_EVENT_CAPACITY,
            status_trigger: None,
        }
    }
}

impl SessionOptions {
    /// Set the largest accepted stream record.
    #[must_use]
    pub fn with_max_record_bytes(mut self, limit: usize) -> Self {
        self.max_record_bytes = limit;
        self
    }

    /// Set the event channel capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Request a status refresh through `trigger` after every turn.
    #[must_use]
    pub fn with_status_trigger(mut self, trigger: StatusTrigger) -> Self {
        self.status_trigger = Some(trigger);
        self
    }
}

/// A conversation with the agent backend.
///
/// Cloning is cheap; clones share the same transcript and turn state.
#[derive(Clone)]
pub struct StreamSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    backend: Arc<dyn AgentBackend>,
    transcript: watch::Sender<Transcript>,
    phase: watch::Sender<TurnPhase>,
    events: broadcast::Sender<SessionEvent>,
    cancel: Mutex<Option<CancellationToken>>,
    status_trigger: Option<StatusTrigger>,
    max_record_bytes: usize,
}

/// A turn that was accepted but has not streamed yet.
struct PendingTurn {
    id: TurnId,
    message: String,
    cancel: CancellationToken,
}

impl StreamSession {
    /// Create a session with default options.
    pub fn new(backend: Arc<dyn AgentBackend>) -> Self {
        Self::with_options(backend, SessionOptions::default())
    }

    /// Create a session with custom options.
    pub fn with_options(backend: Arc<dyn AgentBackend>, options: SessionOptions) -> Self {
        let (transcript, _) = watch::channel(Transcript::new());
        let (phase, _) = watch::channel(TurnPhase::Idle);
        let (events, _) = broadcast::channel(options.event_capacity.max(1));

        Self {
            inner: Arc::new(SessionInner {
                backend,
                transcript,
                phase,
                events,
                cancel: Mutex::new(None),
                status_trigger: options.status_trigger,
                max_record_bytes: options.max_record_bytes,
            }),
        }
    }

    /// Current transcript snapshot.
    pub fn transcript(&self) -> Transcript {
        self.inner.transcript.borrow().clone()
    }

    /// Subscribe to transcript snapshots.
    pub fn subscribe_transcript(&self) -> watch::Receiver<Transcript> {
        self.inner.transcript.subscribe()
    }

    /// Current phase.
    pub fn phase(&self) -> TurnPhase {
        *self.inner.phase.borrow()
    }

    /// Subscribe to phase changes.
    pub fn subscribe_phase(&self) -> watch::Receiver<TurnPhase> {
        self.inner.phase.subscribe()
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Whether a turn is running.
    pub fn is_busy(&self) -> bool {
        self.phase().is_in_flight()
    }

    /// Send a message and stream the reply to completion.
    ///
    /// Returns an error without touching the transcript if the message is
    /// blank or another turn is in flight. Transport and stream failures do
    /// not surface here: they end the turn with a
    /// [`MessageStatus::Failed`] reply.
    ///
    /// Dropping the returned future fails the turn.
    pub async fn submit(&self, message: impl Into<String>) -> Result<TurnOutcome, SessionError> {
        let turn = self.inner.begin(message.into())?;
        Ok(self.inner.run(turn).await)
    }

    /// Like [`submit`](Self::submit), but streams on a background task.
    ///
    /// The user message and placeholder are in the transcript by the time
    /// this returns.
    pub fn spawn_submit(
        &self,
        message: impl Into<String>,
    ) -> Result<JoinHandle<TurnOutcome>, SessionError> {
        let turn = self.inner.begin(message.into())?;
        let inner = Arc::clone(&self.inner);
        Ok(tokio::spawn(async move { inner.run(turn).await }))
    }

    /// Cancel the running turn. Content received so far is kept.
    ///
    /// Returns `false` if there was nothing to cancel.
    pub fn abort(&self) -> bool {
        match self.inner.cancel.lock().as_ref() {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }
}

impl SessionInner {
    fn begin(&self, message: String) -> Result<PendingTurn, SessionError> {
        if message.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let mut previous = TurnPhase::Idle;
        let accepted = self.phase.send_if_modified(|phase| {
            previous = *phase;
            if phase.is_in_flight() {
                return false;
            }
            *phase = TurnPhase::Submitting;
            true
        });
        if !accepted {
            debug!("Ignoring submission while a turn is in flight");
            return Err(SessionError::TurnInFlight);
        }

        let mut placeholder = None;
        let begun = self.publish(|transcript| {
            let mut next = transcript.clone();
            placeholder = Some(next.begin_turn(message.as_str())?);
            Ok::<_, TranscriptError>(next)
        });
        let message_id = match (begun, placeholder) {
            (Ok(()), Some(id)) => id,
            _ => {
                self.phase.send_replace(previous);
                return Err(SessionError::TurnInFlight);
            }
        };

        let id = TurnId::new();
        let cancel = CancellationToken::new();
        *self.cancel.lock() = Some(cancel.clone());

        info!(turn = %id, message_id = %message_id, "Turn submitted");
        self.emit(SessionEvent::TurnStarted {
            turn: id.clone(),
            message_id,
        });

        Ok(PendingTurn {
            id,
            message,
            cancel,
        })
    }

    async fn run(&self, turn: PendingTurn) -> TurnOutcome {
        let span = tracing::info_span!("turn", turn = %turn.id);

        async move {
            let mut guard = TurnGuard {
                session: self,
                turn: turn.id.clone(),
                decode_warnings: 0,
                armed: true,
            };

            let status = match self.stream(&turn, &mut guard.decode_warnings).await {
                Ok(()) => MessageStatus::Completed,
                Err(error) => {
                    warn!(error = %error, "Turn failed");
                    MessageStatus::failed(error.to_string())
                }
            };
            guard.finish(status)
        }
        .instrument(span)
        .await
    }

    async fn stream(&self, turn: &PendingTurn, decode_warnings: &mut usize) -> ClientResult<()> {
        let cancel = &turn.cancel;

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            opened = self.backend.open_chat(&turn.message) => opened?,
        };

        let mut first_chunk = true;
        let body = body.inspect(|chunk| {
            if first_chunk && chunk.as_ref().is_ok_and(|bytes| !bytes.is_empty()) {
                first_chunk = false;
                self.mark_streaming(&turn.id);
            }
        });
        let framer = LineFramer::with_max_record_bytes(self.max_record_bytes);
        let mut records = std::pin::pin!(NdjsonStream::with_framer(body, framer));

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                next = records.next() => next,
            };
            let Some(record) = next else {
                return Ok(());
            };

            match interpret(&record?) {
                Delta::Unknown { raw, issue } => {
                    *decode_warnings += 1;
                    self.emit(SessionEvent::DecodeWarning {
                        turn: turn.id.clone(),
                        raw,
                        issue,
                    });
                }
                delta => self.publish(|transcript| reduce(transcript, &delta))?,
            }
        }
    }

    fn mark_streaming(&self, turn: &TurnId) {
        let opened = self.phase.send_if_modified(|phase| {
            if *phase != TurnPhase::Submitting {
                return false;
            }
            *phase = TurnPhase::Streaming;
            true
        });
        if opened {
            debug!(turn = %turn, "Stream opened");
            self.emit(SessionEvent::StreamOpened { turn: turn.clone() });
        }
    }

    fn finish(&self, turn: &TurnId, status: MessageStatus, decode_warnings: usize) -> TurnOutcome {
        self.cancel.lock().take();

        let finalized = self.publish(|transcript| {
            let mut next = transcript.clone();
            next.finish_active(status.clone())?;
            Ok::<_, TranscriptError>(next)
        });
        if let Err(error) = finalized {
            warn!(turn = %turn, error = %error, "Could not finalize reply");
        }
        let transcript = self.transcript.borrow().clone();

        let (phase, event) = match &status {
            MessageStatus::Failed { reason } => (
                TurnPhase::Failed,
                SessionEvent::TurnFailed {
                    turn: turn.clone(),
                    reason: reason.clone(),
                },
            ),
            _ => (
                TurnPhase::Completed,
                SessionEvent::TurnCompleted { turn: turn.clone() },
            ),
        };
        self.phase.send_replace(phase);
        info!(turn = %turn, ?phase, decode_warnings, "Turn finished");
        self.emit(event);

        if let Some(trigger) = &self.status_trigger {
            trigger.request_refresh();
        }

        TurnOutcome {
            turn: turn.clone(),
            status,
            transcript,
            decode_warnings,
        }
    }

    fn publish<E, F>(&self, update: F) -> Result<(), E>
    where
        F: FnOnce(&Transcript) -> Result<Transcript, E>,
    {
        let next = update(&self.transcript.borrow())?;
        self.transcript.send_replace(next);
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Finalizes the turn even if the turn future is dropped mid-stream.
struct TurnGuard<'a> {
    session: &'a SessionInner,
    turn: TurnId,
    decode_warnings: usize,
    armed: bool,
}

impl TurnGuard<'_> {
    fn finish(mut self, status: MessageStatus) -> TurnOutcome {
        self.armed = false;
        self.session
            .finish(&self.turn, status, self.decode_warnings)
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(turn = %self.turn, "Turn dropped before completion");
            self.session.finish(
                &self.turn,
                MessageStatus::failed(ClientError::Cancelled.to_string()),
                self.decode_warnings,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ByteStream;
    use alice_core::{MemorySnapshot, OutputFile, Role, SkillRegistry};
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::channel::mpsc;
    use futures::stream;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::time::Duration;

    #[derive(Default)]
    struct ScriptedBackend {
        chats: Mutex<VecDeque<ClientResult<ByteStream>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn with_chats(chats: Vec<ClientResult<ByteStream>>) -> Arc<Self> {
            Arc::new(Self {
                chats: Mutex::new(chats.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().clone()
        }
    }

    #[async_trait]
    impl AgentBackend for ScriptedBackend {
        async fn open_chat(&self, message: &str) -> ClientResult<ByteStream> {
            self.prompts.lock().push(message.to_string());
            let next = self.chats.lock().pop_front();
            next.unwrap_or_else(|| Err(ClientError::InvalidResponse("no scripted reply".into())))
        }
        async fn fetch_tasks(&self) -> ClientResult<String> {
            Ok(String::new())
        }
        async fn fetch_skills(&self) -> ClientResult<SkillRegistry> {
            Ok(SkillRegistry::new())
        }
        async fn fetch_outputs(&self) -> ClientResult<Vec<OutputFile>> {
            Ok(Vec::new())
        }
        async fn fetch_memory(&self) -> ClientResult<MemorySnapshot> {
            Ok(MemorySnapshot::default())
        }
    }

    fn chunks(parts: &[&'static str]) -> ClientResult<ByteStream> {
        let items: Vec<ClientResult<Bytes>> = parts
            .iter()
            .copied()
            .map(|part| Ok(Bytes::from_static(part.as_bytes())))
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }

    fn live_chat() -> (
        mpsc::UnboundedSender<ClientResult<Bytes>>,
        ClientResult<ByteStream>,
    ) {
        let (tx, rx) = mpsc::unbounded();
        (tx, Ok(Box::pin(rx)))
    }

    fn content_record(text: &str) -> Bytes {
        Bytes::from(format!("{{\"type\":\"content\",\"delta\":\"{text}\"}}\n"))
    }

    #[tokio::test]
    async fn test_chunked_reply_completes() {
        let backend = ScriptedBackend::with_chats(vec![chunks(&[
            r#"{"type":"content","delta":"Hel"#,
            "lo\"}\n{\"type\":\"execution_result\",\"content\":\"42\"}\n",
        ])]);
        let session = StreamSession::new(backend.clone());

        let outcome = session.submit("hello").await.unwrap();

        assert!(outcome.is_completed());
        let reply = outcome.reply().unwrap();
        assert_eq!(reply.role(), Role::Bot);
        assert_eq!(reply.content(), "Hello");
        assert_eq!(reply.execution_results(), ["42"]);
        assert_eq!(reply.status(), &MessageStatus::Completed);

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.get(0).unwrap().content(), "hello");
        assert_eq!(session.phase(), TurnPhase::Completed);
        assert_eq!(backend.prompts(), ["hello"]);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_partial_reply() {
        let failing: ByteStream = Box::pin(stream::iter(vec![
            Ok(content_record("A")),
            Ok(content_record("B")),
            Err(ClientError::Connection("reset by peer".into())),
        ]));
        let backend = ScriptedBackend::with_chats(vec![Ok(failing), chunks(&[
            "{\"type\":\"content\",\"delta\":\"again\"}\n",
        ])]);
        let session = StreamSession::new(backend);

        let outcome = session.submit("first").await.unwrap();
        let reply = outcome.reply().unwrap();
        assert_eq!(reply.content(), "AB");
        assert!(reply.status().is_failed());
        assert_eq!(session.phase(), TurnPhase::Failed);

        let retry = session.submit("second").await.unwrap();
        assert!(retry.is_completed());
        assert_eq!(session.transcript().len(), 4);
        assert_eq!(session.transcript().get(1).unwrap().content(), "AB");
    }

    #[tokio::test]
    async fn test_open_failure_fails_empty_reply() {
        let backend = ScriptedBackend::with_chats(vec![Err(ClientError::http(500, "boom"))]);
        let session = StreamSession::new(backend);

        let outcome = session.submit("hi").await.unwrap();
        let reply = outcome.reply().unwrap();

        assert_eq!(reply.content(), "");
        match reply.status() {
            MessageStatus::Failed { reason } => assert!(reason.contains("500")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_submission_ignored_while_in_flight() {
        let (tx, chat) = live_chat();
        let backend = ScriptedBackend::with_chats(vec![chat]);
        let session = StreamSession::new(backend.clone());

        let running = session.spawn_submit("first").unwrap();
        assert!(session.is_busy());

        let err = session.submit("second").await.unwrap_err();
        assert_eq!(err, SessionError::TurnInFlight);
        assert_eq!(session.transcript().len(), 2);

        tx.unbounded_send(Ok(content_record("ok"))).unwrap();
        drop(tx);

        let outcome = running.await.unwrap();
        assert_eq!(outcome.reply().unwrap().content(), "ok");
        assert_eq!(backend.prompts(), ["first"]);
    }

    #[tokio::test]
    async fn test_submission_ignored_while_streaming() {
        let (tx, chat) = live_chat();
        let backend = ScriptedBackend::with_chats(vec![chat]);
        let session = StreamSession::new(backend.clone());
        let mut phase = session.subscribe_phase();

        let running = session.spawn_submit("first").unwrap();
        tx.unbounded_send(Ok(content_record("partial"))).unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while *phase.borrow_and_update() != TurnPhase::Streaming {
                phase.changed().await.unwrap();
            }
        })
        .await
        .unwrap();

        let err = session.submit("second").await.unwrap_err();
        assert_eq!(err, SessionError::TurnInFlight);
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.phase(), TurnPhase::Streaming);

        drop(tx);
        let outcome = running.await.unwrap();
        assert!(outcome.is_completed());
        assert_eq!(outcome.reply().unwrap().content(), "partial");
        assert_eq!(backend.prompts(), ["first"]);
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let session = StreamSession::new(ScriptedBackend::with_chats(Vec::new()));

        let err = session.submit("  \n").await.unwrap_err();

        assert_eq!(err, SessionError::EmptyMessage);
        assert!(session.transcript().is_empty());
        assert_eq!(session.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn test_abort_keeps_partial_content() {
        let (tx, chat) = live_chat();
        let session = StreamSession::new(ScriptedBackend::with_chats(vec![chat]));
        let mut updates = session.subscribe_transcript();

        let running = session.spawn_submit("long task").unwrap();
        tx.unbounded_send(Ok(content_record("A"))).unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                updates.changed().await.unwrap();
                let seen = updates
                    .borrow_and_update()
                    .last()
                    .is_some_and(|m| m.content() == "A");
                if seen {
                    break;
                }
            }
        })
        .await
        .unwrap();

        assert!(session.abort());
        let outcome = running.await.unwrap();

        let reply = outcome.reply().unwrap();
        assert_eq!(reply.content(), "A");
        assert!(reply.status().is_failed());
        assert_eq!(session.phase(), TurnPhase::Failed);
        assert!(!session.abort());

        // Bytes after the abort are never read.
        let _ = tx.unbounded_send(Ok(content_record("B")));
        assert_eq!(session.transcript().get(1).unwrap().content(), "A");
    }

    #[tokio::test]
    async fn test_dropped_submit_fails_turn() {
        let (_tx, chat) = live_chat();
        let session = StreamSession::new(ScriptedBackend::with_chats(vec![chat]));

        let result = tokio::time::timeout(Duration::from_millis(20), session.submit("slow")).await;
        assert!(result.is_err());

        assert_eq!(session.phase(), TurnPhase::Failed);
        assert!(session.transcript().last().unwrap().status().is_failed());
        assert!(!session.transcript().has_active());
    }

    #[tokio::test]
    async fn test_events_in_order_with_decode_warning() {
        let backend = ScriptedBackend::with_chats(vec![chunks(&[
            "{\"type\":\"content\",\"delta\":\"A\"}\n",
            "{\"type\":\"content\",\"delta\":\n",
            "{\"type\":\"content\",\"delta\":\"B\"}\n",
        ])]);
        let session = StreamSession::new(backend);
        let mut events = session.subscribe_events();

        let outcome = session.submit("go").await.unwrap();
        assert_eq!(outcome.decode_warnings, 1);
        assert_eq!(outcome.reply().unwrap().content(), "AB");

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(seen.len(), 4);
        assert!(matches!(seen[0], SessionEvent::TurnStarted { .. }));
        assert!(matches!(seen[1], SessionEvent::StreamOpened { .. }));
        assert!(matches!(
            &seen[2],
            SessionEvent::DecodeWarning { issue: DecodeIssue::Malformed { .. }, .. }
        ));
        assert_eq!(
            seen[3],
            SessionEvent::TurnCompleted {
                turn: outcome.turn.clone()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_body_completes_without_streaming_phase() {
        let session = StreamSession::new(ScriptedBackend::with_chats(vec![chunks(&[])]));
        let mut events = session.subscribe_events();

        let outcome = session.submit("quiet").await.unwrap();

        assert!(outcome.is_completed());
        assert_eq!(outcome.reply().unwrap().content(), "");
        let mut opened = false;
        while let Ok(event) = events.try_recv() {
            opened |= matches!(event, SessionEvent::StreamOpened { .. });
        }
        assert!(!opened);
    }

    #[tokio::test]
    async fn test_oversized_record_fails_turn() {
        let backend = ScriptedBackend::with_chats(vec![chunks(&[
            "{\"type\":\"content\",\"delta\":\"ok\"}\n",
            "{\"type\":\"content\",\"delta\":\"this record never ends",
        ])]);
        let options = SessionOptions::default().with_max_record_bytes(16);
        let session = StreamSession::with_options(backend, options);

        let outcome = session.submit("big").await.unwrap();

        assert!(outcome.status.is_failed());
        assert_eq!(outcome.reply().unwrap().content(), "ok");
        assert_eq!(session.phase(), TurnPhase::Failed);
    }

    #[tokio::test]
    async fn test_oversized_tail_in_same_chunk_keeps_earlier_record() {
        let backend = ScriptedBackend::with_chats(vec![chunks(&[concat!(
            "{\"type\":\"content\",\"delta\":\"ok\"}\n",
            "{\"type\":\"content\",\"delta\":\"this record never ends",
        )])]);
        let options = SessionOptions::default().with_max_record_bytes(16);
        let session = StreamSession::with_options(backend, options);

        let outcome = session.submit("big").await.unwrap();

        assert!(outcome.status.is_failed());
        assert_eq!(outcome.reply().unwrap().content(), "ok");
        assert_eq!(session.phase(), TurnPhase::Failed);
    }

    #[tokio::test]
    async fn test_zero_length_chunk_does_not_open_stream() {
        let (tx, chat) = live_chat();
        let session = StreamSession::new(ScriptedBackend::with_chats(vec![chat]));
        let mut events = session.subscribe_events();

        let running = session.spawn_submit("wait").unwrap();
        tx.unbounded_send(Ok(Bytes::new())).unwrap();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(session.phase(), TurnPhase::Submitting);
        assert!(matches!(
            events.try_recv(),
            Ok(SessionEvent::TurnStarted { .. })
        ));
        assert!(events.try_recv().is_err());

        tx.unbounded_send(Ok(content_record("x"))).unwrap();
        drop(tx);
        let outcome = running.await.unwrap();

        assert!(outcome.is_completed());
        assert!(matches!(
            events.try_recv(),
            Ok(SessionEvent::StreamOpened { .. })
        ));
    }

    #[tokio::test]
    async fn test_finished_turn_requests_status_refresh() {
        let trigger = StatusTrigger::new();
        let backend = ScriptedBackend::with_chats(vec![chunks(&[
            "{\"type\":\"content\",\"delta\":\"done\"}\n",
        ])]);
        let options = SessionOptions::default().with_status_trigger(trigger.clone());
        let session = StreamSession::with_options(backend, options);

        session.submit("go").await.unwrap();

        tokio::time::timeout(Duration::from_millis(100), trigger.requested())
            .await
            .expect("status refresh should be requested");
    }
}
