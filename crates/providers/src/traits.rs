use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use nv_domain::chat::Message;
use nv_domain::error::Result;
use nv_domain::tool::{ToolCall, ToolDefinition};
use nv_domain::usage::TokenUsage;

/// A structured-output binding: the model is asked to reply with an object
/// matching `schema`.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema of the expected object.
    pub schema: Value,
}

/// A provider-agnostic chat request. Serializable so the response cache
/// can fingerprint it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    /// Tool definitions the model may invoke.
    pub tools: Vec<ToolDefinition>,
    /// Structured-output binding, when the caller wants a typed reply.
    pub structured: Option<StructuredSpec>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// The normalized model response shared by every adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Plain text content.
    pub content: String,
    /// Chain-of-thought text where the provider exposes one. Providers key
    /// this differently (`thinking`, `reasoning_content`, thought parts);
    /// adapters normalize it here.
    pub reasoning: Option<String>,
    /// Decoded object when the request bound a structured-output schema.
    pub structured: Option<Value>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: TokenUsage,
}

/// Trait every LLM adapter implements.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a chat request and wait for the full normalized response.
    async fn chat(&self, req: &ChatRequest) -> Result<LlmResponse>;

    /// Short identifier used in logs and error messages.
    fn id(&self) -> &str;
}
