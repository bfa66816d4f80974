//! The common shapes every provider adapter normalizes to (spec.md §4.8).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Message { role: Role::System, content: content.into() }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Message { role: Role::User, content: content.into() }
    }
}

/// A single request to one provider: the messages plus the resolved
/// model (spec.md §4.8 `resolve_model`) and timeout.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub tool: String,
    pub command: String,
    pub flags: Vec<String>,
    pub model: String,
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub timeout: std::time::Duration,
}

/// Every provider adapter's output shape (spec.md §4.8): `{tool, model,
/// text, elapsed_s, success, error?}`. `from_cache` is set by the
/// orchestrator's cache layer (spec.md §4.8), never by the adapter
/// itself — a fresh subprocess invocation is always `from_cache: false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub tool: String,
    pub model: String,
    pub text: String,
    pub elapsed_s: f64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub from_cache: bool,
}

impl ToolResponse {
    #[must_use]
    pub fn cached(mut self) -> Self {
        self.from_cache = true;
        self
    }
}
