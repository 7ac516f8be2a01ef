//! Backend transport.
//!
//! [`AgentBackend`] is the seam between the session/status logic and the
//! network. [`HttpBackend`] talks to the real server; tests substitute
//! scripted or mocked implementations.

use crate::config::{paths, ClientConfig};
use crate::error::{ClientError, ClientResult};
use crate::types::{ChatRequest, OutputsResponse, SkillsResponse, TasksResponse};
use alice_core::{MemorySnapshot, OutputFile, SkillRegistry};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use std::pin::Pin;
use std::time::Duration;
use url::Url;

/// Raw body chunks of a chat response.
pub type ByteStream = Pin<Box<dyn Stream<Item = ClientResult<Bytes>> + Send>>;

/// Operations the client needs from the agent backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Send a chat message and return the response body as it arrives.
    async fn open_chat(&self, message: &str) -> ClientResult<ByteStream>;

    /// Fetch the task plan.
    async fn fetch_tasks(&self) -> ClientResult<String>;

    /// Fetch the skill registry.
    async fn fetch_skills(&self) -> ClientResult<SkillRegistry>;

    /// Fetch the output file listing.
    async fn fetch_outputs(&self) -> ClientResult<Vec<OutputFile>>;

    /// Fetch the memory documents.
    async fn fetch_memory(&self) -> ClientResult<MemorySnapshot>;
}

/// Resolved endpoint URLs.
#[derive(Debug, Clone)]
struct Endpoints {
    chat: Url,
    tasks: Url,
    skills: Url,
    outputs: Url,
    memory: Url,
}

impl Endpoints {
    fn new(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self {
            chat: config.endpoint(paths::CHAT)?,
            tasks: config.endpoint(paths::TASKS)?,
            skills: config.endpoint(paths::SKILLS)?,
            outputs: config.endpoint(paths::OUTPUTS)?,
            memory: config.endpoint(paths::MEMORY)?,
        })
    }
}

/// [`AgentBackend`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoints: Endpoints,
    request_timeout: Option<Duration>,
}

impl HttpBackend {
    /// Create a backend with its own HTTP client.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        Self::with_client(builder.build()?, config)
    }

    /// Create a backend sharing an existing HTTP client.
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self {
            client,
            endpoints: Endpoints::new(config)?,
            request_timeout: config.request_timeout,
        })
    }

    /// The chat endpoint URL.
    pub fn chat_url(&self) -> &Url {
        &self.endpoints.chat
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> ClientResult<T> {
        let mut request = self.client.get(url.clone());
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        let response = check_status(request.send().await?).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            ClientError::InvalidResponse(format!("{url}: {e}"))
        })
    }
}

async fn check_status(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::http(status.as_u16(), body))
}

#[async_trait]
impl AgentBackend for HttpBackend {
    async fn open_chat(&self, message: &str) -> ClientResult<ByteStream> {
        tracing::debug!(url = %self.endpoints.chat, "Opening chat stream");

        let response = self
            .client
            .post(self.endpoints.chat.clone())
            .json(&ChatRequest::new(message))
            .send()
            .await?;
        let response = check_status(response).await?;

        Ok(Box::pin(
            response.bytes_stream().map(|chunk| chunk.map_err(ClientError::from)),
        ))
    }

    async fn fetch_tasks(&self) -> ClientResult<String> {
        let resp: TasksResponse = self.get_json(&self.endpoints.tasks).await?;
        Ok(resp.content)
    }

    async fn fetch_skills(&self) -> ClientResult<SkillRegistry> {
        let resp: SkillsResponse = self.get_json(&self.endpoints.skills).await?;
        Ok(resp.skills)
    }

    async fn fetch_outputs(&self) -> ClientResult<Vec<OutputFile>> {
        let resp: OutputsResponse = self.get_json(&self.endpoints.outputs).await?;
        Ok(resp.files)
    }

    async fn fetch_memory(&self) -> ClientResult<MemorySnapshot> {
        self.get_json(&self.endpoints.memory).await
    }
}
