//! Background refresh of the task, skill, and output resources.
//!
//! [`StatusSync`] fetches all three resources on a fixed period and whenever
//! a [`StatusTrigger`] fires (the chat session fires one after every turn).
//! Each resource is applied on its own, so one failing endpoint never holds
//! back or erases the others.
//!
//! A triggered refresh restarts the period: the next scheduled poll comes a
//! full interval after it rather than immediately after.

use crate::backend::AgentBackend;
use crate::error::ClientResult;
use alice_core::{now_utc, ResourceKind, StatusSnapshot};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Requests an out-of-schedule status refresh.
///
/// Requests made while a refresh is already pending collapse into one.
#[derive(Debug, Clone, Default)]
pub struct StatusTrigger {
    notify: Arc<Notify>,
}

impl StatusTrigger {
    /// Create a trigger not yet attached to any poller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the poller to refresh as soon as possible.
    pub fn request_refresh(&self) {
        self.notify.notify_one();
    }

    pub(crate) async fn requested(&self) {
        self.notify.notified().await;
    }
}

/// Handle for controlling a running status poller.
///
/// Dropping the handle stops the poller.
#[derive(Debug)]
pub struct StatusSyncHandle {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl StatusSyncHandle {
    /// Check if the poller task is still running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the poller to stop. An in-flight refresh is abandoned.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Wait for the poller to finish.
    pub async fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// Stop the poller and wait for it to finish.
    pub async fn shutdown(self) {
        self.stop();
        self.wait().await;
    }
}

impl Drop for StatusSyncHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Keeps a [`StatusSnapshot`] current.
#[derive(Clone)]
pub struct StatusSync {
    inner: Arc<StatusInner>,
}

struct StatusInner {
    backend: Arc<dyn AgentBackend>,
    snapshot: watch::Sender<StatusSnapshot>,
    trigger: StatusTrigger,
    interval: Duration,
    running: Mutex<Option<CancellationToken>>,
}

impl StatusSync {
    /// Create a poller. Nothing is fetched until [`refresh`](Self::refresh)
    /// or [`spawn`](Self::spawn) is called.
    pub fn new(backend: Arc<dyn AgentBackend>, interval: Duration) -> Self {
        let (snapshot, _) = watch::channel(StatusSnapshot::new());
        Self {
            inner: Arc::new(StatusInner {
                backend,
                snapshot,
                trigger: StatusTrigger::new(),
                interval: interval.max(Duration::from_millis(1)),
                running: Mutex::new(None),
            }),
        }
    }

    /// The refresh period.
    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// A trigger that makes the running poller refresh early.
    pub fn trigger(&self) -> StatusTrigger {
        self.inner.trigger.clone()
    }

    /// Fetch every resource once, concurrently.
    pub async fn refresh(&self) {
        self.inner.refresh_all().await;
    }

    /// Start polling in a background task.
    ///
    /// The first refresh happens immediately. Spawning again stops the
    /// previous poller; the snapshot carries over.
    pub fn spawn(&self) -> StatusSyncHandle {
        let cancel = CancellationToken::new();
        if let Some(previous) = self.inner.running.lock().replace(cancel.clone()) {
            previous.cancel();
        }

        let inner = Arc::clone(&self.inner);
        let token = cancel.clone();
        let handle = tokio::spawn(async move { inner.run(token).await });

        StatusSyncHandle {
            cancel,
            handle: Some(handle),
        }
    }
}

impl StatusInner {
    async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(interval_ms = self.interval.as_millis() as u64, "Status sync started");

        loop {
            let reason = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.trigger.requested() => {
                    ticker.reset();
                    "trigger"
                }
                _ = ticker.tick() => "interval",
            };

            debug!(reason, "Refreshing status");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.refresh_all() => {}
            }
        }

        debug!("Status sync stopped");
    }

    async fn refresh_all(&self) {
        let backend = &self.backend;
        tokio::join!(
            self.refresh_resource(ResourceKind::Tasks, backend.fetch_tasks(), |s, v, at| {
                s.tasks.record_success(v, at)
            }),
            self.refresh_resource(ResourceKind::Skills, backend.fetch_skills(), |s, v, at| {
                s.skills.record_success(v, at)
            }),
            self.refresh_resource(ResourceKind::Outputs, backend.fetch_outputs(), |s, v, at| {
                s.outputs.record_success(v, at)
            }),
        );
    }

    async fn refresh_resource<T, Fut, F>(&self, kind: ResourceKind, fetch: Fut, store: F)
    where
        Fut: Future<Output = ClientResult<T>>,
        F: FnOnce(&mut StatusSnapshot, T, DateTime<Utc>),
    {
        match fetch.await {
            Ok(value) => {
                self.snapshot.send_modify(|s| store(s, value, now_utc()));
                debug!(resource = %kind, "Status resource refreshed");
            }
            Err(error) => {
                warn!(
                    resource = %kind,
                    error = %error,
                    "Status refresh failed, keeping last known value"
                );
                self.snapshot
                    .send_modify(|s| s.record_failure(kind, error.to_string()));
            }
        }
    }
}
