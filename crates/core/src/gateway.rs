//! Completion gateway trait — one request/response round trip with the
//! LLM provider.
//!
//! The agent loop calls `complete()` without knowing which backend is in
//! use; tests substitute a scripted mock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;
use crate::tool::{ToolCall, ToolDefinition};

/// One completion request: full history plus the advertised tool schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// The conversation messages, in order
    pub messages: Vec<Message>,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// What came back: free text, requested tool calls, or both.
///
/// Tool-call arguments arrive parsed; a provider-side argument string that
/// failed to parse is represented as an empty object (argument-shape
/// validation is the tool implementation's job).
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    /// Assistant text, if any
    pub content: Option<String>,

    /// Requested tool calls, in the order the model returned them
    pub tool_calls: Vec<ToolCall>,
}

/// The gateway trait. Implementations never panic and never return partial
/// state: transport and non-2xx failures come back as `ProviderError`.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// A human-readable name for this backend (e.g., "openai").
    fn name(&self) -> &str;

    /// Send the conversation and tool schema; get the assistant's reply.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError>;
}
