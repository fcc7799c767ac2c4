//! Anthropic-native adapter.
//!
//! Implements the Anthropic Messages API including tool use and structured
//! output. System messages go in the separate top-level `system` field;
//! structured output is requested by forcing a single `record` tool whose
//! input schema is the caller's output schema.

use serde_json::Value;

use nv_domain::chat::{ContentPart, MessageContent, Role};
use nv_domain::error::{Error, Result};
use nv_domain::model::Model;
use nv_domain::tool::{ToolCall, ToolDefinition};
use nv_domain::usage::TokenUsage;

use crate::traits::{ChatProvider, ChatRequest, LlmResponse};
use crate::util::{from_reqwest, http_client, optional_env, require_env};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Name of the synthetic tool used for structured output.
const RECORD_TOOL: &str = "record";

pub struct AnthropicProvider {
    model_name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(model: &Model) -> Result<Self> {
        Ok(Self {
            model_name: model.name.clone(),
            base_url: optional_env("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.into())
                .trim_end_matches('/')
                .to_string(),
            api_key: require_env("ANTHROPIC_API_KEY")?,
            client: http_client()?,
        })
    }

    fn build_body(&self, req: &ChatRequest) -> Value {
        let mut system_parts: Vec<String> = Vec::new();
        let mut api_messages: Vec<Value> = Vec::new();

        for msg in &req.messages {
            match msg.role {
                Role::System => system_parts.push(msg.content.text()),
                Role::User => api_messages.push(serde_json::json!({
                    "role": "user",
                    "content": content_to_anthropic(&msg.content),
                })),
                Role::Assistant => api_messages.push(serde_json::json!({
                    "role": "assistant",
                    "content": content_to_anthropic(&msg.content),
                })),
            }
        }

        let mut body = serde_json::json!({
            "model": self.model_name,
            "messages": api_messages,
            "max_tokens": req.max_tokens.unwrap_or(4096),
        });

        if !system_parts.is_empty() {
            body["system"] = Value::String(system_parts.join("\n\n"));
        }

        let mut tools: Vec<Value> = req.tools.iter().map(tool_to_anthropic).collect();
        if let Some(spec) = &req.structured {
            tools.push(serde_json::json!({
                "name": RECORD_TOOL,
                "description": spec.description,
                "input_schema": spec.schema,
            }));
            body["tool_choice"] = serde_json::json!({"type": "tool", "name": RECORD_TOOL});
        }
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools);
        }

        if let Some(temp) = req.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        body
    }
}

fn content_to_anthropic(content: &MessageContent) -> Value {
    match content {
        MessageContent::Text(t) => Value::String(t.clone()),
        MessageContent::Parts(parts) => {
            let blocks: Vec<Value> = parts
                .iter()
                .map(|p| match p {
                    ContentPart::Text { text } => serde_json::json!({
                        "type": "text",
                        "text": text,
                    }),
                    ContentPart::Image { data, media_type } => serde_json::json!({
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": media_type,
                            "data": data,
                        }
                    }),
                })
                .collect();
            Value::Array(blocks)
        }
    }
}

fn tool_to_anthropic(tool: &ToolDefinition) -> Value {
    serde_json::json!({
        "name": tool.name,
        "description": tool.description,
        "input_schema": tool.parameters,
    })
}

fn parse_response(body: &Value, structured_requested: bool) -> LlmResponse {
    let empty = Vec::new();
    let blocks = body
        .get("content")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let mut text_parts: Vec<String> = Vec::new();
    let mut reasoning: Option<String> = None;
    let mut structured: Option<Value> = None;
    let mut tool_calls: Vec<ToolCall> = Vec::new();

    for block in blocks {
        match block.get("type").and_then(Value::as_str).unwrap_or("") {
            "text" => {
                if let Some(t) = block.get("text").and_then(Value::as_str) {
                    text_parts.push(t.to_string());
                }
            }
            "thinking" => {
                reasoning = block
                    .get("thinking")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            "tool_use" => {
                let name = block
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let input = block
                    .get("input")
                    .cloned()
                    .unwrap_or(Value::Object(Default::default()));
                if structured_requested && name == RECORD_TOOL {
                    structured = Some(input);
                } else {
                    tool_calls.push(ToolCall {
                        tool: name.to_string(),
                        args: input,
                    });
                }
            }
            _ => {}
        }
    }

    let usage = body
        .get("usage")
        .map(|u| {
            TokenUsage::new(
                u.get("input_tokens").and_then(Value::as_u64).unwrap_or(0),
                u.get("output_tokens").and_then(Value::as_u64).unwrap_or(0),
            )
        })
        .unwrap_or_default();

    LlmResponse {
        content: text_parts.join(""),
        reasoning,
        structured,
        tool_calls,
        usage,
    }
}

/// Classify an error response. Rate limits and overload errors are
/// transient; everything else surfaces as-is.
fn classify_error(status: reqwest::StatusCode, body: &str) -> Error {
    if status.as_u16() == 429 || status.as_u16() == 529 || body.contains("overloaded_error") {
        Error::Throttled {
            provider: "anthropic".into(),
            message: format!("HTTP {} - {}", status.as_u16(), body),
        }
    } else {
        Error::Provider {
            provider: "anthropic".into(),
            message: format!("HTTP {} - {}", status.as_u16(), body),
        }
    }
}

#[async_trait::async_trait]
impl ChatProvider for AnthropicProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<LlmResponse> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_body(req);

        tracing::debug!(model = %self.model_name, url = %url, "anthropic chat request");

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;
        if !status.is_success() {
            return Err(classify_error(status, &resp_text));
        }

        let resp_json: Value = serde_json::from_str(&resp_text)?;
        Ok(parse_response(&resp_json, req.structured.is_some()))
    }

    fn id(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_text_and_usage() {
        let body = json!({
            "content": [{"type": "text", "text": "hello"}],
            "usage": {"input_tokens": 12, "output_tokens": 3}
        });
        let resp = parse_response(&body, false);
        assert_eq!(resp.content, "hello");
        assert_eq!(resp.usage, TokenUsage::new(12, 3));
        assert!(resp.structured.is_none());
    }

    #[test]
    fn record_tool_becomes_structured_output() {
        let body = json!({
            "content": [
                {"type": "thinking", "thinking": "let me look"},
                {"type": "tool_use", "name": "record", "input": {"explanation": "x", "actions": []}}
            ],
            "usage": {"input_tokens": 1, "output_tokens": 1}
        });
        let resp = parse_response(&body, true);
        assert_eq!(resp.reasoning.as_deref(), Some("let me look"));
        assert_eq!(resp.structured.unwrap()["explanation"], "x");
        assert!(resp.tool_calls.is_empty());
    }

    #[test]
    fn tool_use_blocks_become_tool_calls() {
        let body = json!({
            "content": [
                {"type": "tool_use", "name": "ClickTool", "input": {"id": 4}}
            ]
        });
        let resp = parse_response(&body, false);
        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(resp.tool_calls[0].tool, "ClickTool");
        assert_eq!(resp.tool_calls[0].args, json!({"id": 4}));
    }

    #[test]
    fn rate_limits_classify_as_transient() {
        let err = classify_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "rate limited");
        assert!(err.is_transient());
        let err = classify_error(reqwest::StatusCode::BAD_REQUEST, "bad schema");
        assert!(!err.is_transient());
    }
}
