//! The client facade.

use crate::backend::{AgentBackend, HttpBackend};
use crate::config::ClientConfig;
use crate::error::{ClientResult, SessionError};
use crate::session::{SessionOptions, StreamSession, TurnOutcome};
use crate::status::{StatusSync, StatusSyncHandle};
use alice_core::{MemorySnapshot, OutputFile};
use std::sync::Arc;
use url::Url;

/// A chat session and status poller wired to one backend.
///
/// Every finished turn asks the status poller for an early refresh.
///
/// # Example
///
/// ```rust,no_run
/// use alice_client::{AliceClient, ClientConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = AliceClient::new(ClientConfig::new())?;
/// let _status = client.start_status_sync();
///
/// let outcome = client.send("Summarize the task list").await?;
/// if let Some(reply) = outcome.reply() {
///     println!("{}", reply.content());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AliceClient {
    config: ClientConfig,
    backend: Arc<dyn AgentBackend>,
    session: StreamSession,
    status: StatusSync,
}

impl AliceClient {
    /// Create a client talking HTTP to `config.base_url`.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let backend = HttpBackend::new(&config)?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a client over any backend.
    pub fn with_backend(config: ClientConfig, backend: Arc<dyn AgentBackend>) -> Self {
        let status = StatusSync::new(Arc::clone(&backend), config.poll_interval);
        let options = SessionOptions::default()
            .with_max_record_bytes(config.max_record_bytes)
            .with_event_capacity(config.event_capacity)
            .with_status_trigger(status.trigger());
        let session = StreamSession::with_options(Arc::clone(&backend), options);

        Self {
            config,
            backend,
            session,
            status,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The chat session.
    pub fn session(&self) -> &StreamSession {
        &self.session
    }

    /// The status poller.
    pub fn status(&self) -> &StatusSync {
        &self.status
    }

    /// Start background status polling.
    pub fn start_status_sync(&self) -> StatusSyncHandle {
        self.status.spawn()
    }

    /// Send a message and wait for the reply to finish streaming.
    pub async fn send(&self, message: impl Into<String>) -> Result<TurnOutcome, SessionError> {
        self.session.submit(message).await
    }

    /// Fetch the agent's memory documents.
    pub async fn memory(&self) -> ClientResult<MemorySnapshot> {
        self.backend.fetch_memory().await
    }

    /// Absolute download URL of an output file.
    pub fn output_url(&self, file: &OutputFile) -> ClientResult<Url> {
        Ok(file.resolve_url(&self.config.base()?)?)
    }
}
