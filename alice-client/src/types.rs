//! Request and response bodies of the backend HTTP API.

use alice_core::{OutputFile, SkillRegistry};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
}

impl ChatRequest {
    /// Create a chat request.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of `GET /api/tasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TasksResponse {
    /// The task plan as free text.
    #[serde(default)]
    pub content: String,
}

/// Body of `GET /api/skills`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillsResponse {
    /// Skills keyed by name.
    #[serde(default)]
    pub skills: SkillRegistry,
}

/// Body of `GET /api/outputs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputsResponse {
    /// Produced files.
    #[serde(default)]
    pub files: Vec<OutputFile>,
}
