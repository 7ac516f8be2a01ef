//! Client configuration.
//!
//! Every setting has a default matching a backend on `localhost:8000`; each
//! can be overridden from the environment or with a `with_*` builder.

use crate::error::{ClientError, ClientResult};
use alice_streaming::DEFAULT_MAX_RECORD_BYTES;
use std::time::Duration;
use url::Url;

/// Default backend location.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
/// Default status polling period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Default timeout for the status GET requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default capacity of the session event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Environment variable overriding [`ClientConfig::base_url`].
pub const ENV_BASE_URL: &str = "ALICE_BASE_URL";
/// Environment variable overriding [`ClientConfig::poll_interval`], in seconds.
pub const ENV_POLL_INTERVAL: &str = "ALICE_POLL_INTERVAL_SECS";
/// Environment variable overriding [`ClientConfig::request_timeout`], in seconds.
pub const ENV_REQUEST_TIMEOUT: &str = "ALICE_REQUEST_TIMEOUT_SECS";

/// Backend API paths, relative to the base URL.
pub mod paths {
    /// Streaming chat endpoint.
    pub const CHAT: &str = "api/chat";
    /// Task plan document.
    pub const TASKS: &str = "api/tasks";
    /// Skill registry.
    pub const SKILLS: &str = "api/skills";
    /// Generated output files.
    pub const OUTPUTS: &str = "api/outputs";
    /// Long- and short-term memory.
    pub const MEMORY: &str = "api/memory";
}

/// Configuration for [`AliceClient`](crate::AliceClient) and its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL.
    pub base_url: String,
    /// Period between status refreshes.
    pub poll_interval: Duration,
    /// Timeout for status requests. The chat stream has no overall timeout.
    pub request_timeout: Option<Duration>,
    /// TCP connect timeout for all requests.
    pub connect_timeout: Option<Duration>,
    /// Largest single stream record accepted before the turn fails.
    pub max_record_bytes: usize,
    /// Buffered session events per subscriber.
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from `ALICE_*` environment variables, falling back to defaults.
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL) {
            config.poll_interval = parse_secs(ENV_POLL_INTERVAL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
            config.request_timeout = Some(parse_secs(ENV_REQUEST_TIMEOUT, &raw)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the status polling period.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the status request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the largest accepted stream record.
    #[must_use]
    pub fn with_max_record_bytes(mut self, limit: usize) -> Self {
        self.max_record_bytes = limit;
        self
    }

    /// Set the session event channel capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Check the config for values the client cannot run with.
    pub fn validate(&self) -> ClientResult<()> {
        self.base()?;
        if self.poll_interval.is_zero() {
            return Err(ClientError::config("poll interval must be non-zero"));
        }
        if self.max_record_bytes == 0 {
            return Err(ClientError::config("max record size must be non-zero"));
        }
        if self.event_capacity == 0 {
            return Err(ClientError::config("event capacity must be non-zero"));
        }
        Ok(())
    }

    /// Parsed base URL, always ending in `/` so relative joins keep its path.
    pub fn base(&self) -> ClientResult<Url> {
        let mut url = Url::parse(&self.base_url)?;
        if url.cannot_be_a_base() {
            return Err(ClientError::config(format!(
                "base URL `{}` cannot have paths joined onto it",
                self.base_url
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Absolute URL of an API path such as [`paths::CHAT`].
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base()?.join(path.trim_start_matches('/'))?)
    }
}

fn parse_secs(name: &str, raw: &str) -> ClientResult<Duration> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ClientError::config(format!("{name} must be a number, got `{raw}`")))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ClientError::config(format!(
            "{name} must be positive, got `{raw}`"
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}
