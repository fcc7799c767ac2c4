//! Google Gemini adapter.
//!
//! Implements the Gemini `generateContent` API. Auth is an API key passed
//! as a query parameter; structured output binds `responseSchema` in the
//! generation config, and thought parts are surfaced as reasoning.

use serde_json::Value;

use nv_domain::chat::{ContentPart, MessageContent, Role};
use nv_domain::error::{Error, Result};
use nv_domain::model::Model;
use nv_domain::tool::{ToolCall, ToolDefinition};
use nv_domain::usage::TokenUsage;

use crate::traits::{ChatProvider, ChatRequest, LlmResponse};
use crate::util::{from_reqwest, http_client, optional_env, require_env};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GoogleProvider {
    model_name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(model: &Model) -> Result<Self> {
        Ok(Self {
            model_name: model.name.clone(),
            base_url: optional_env("GOOGLE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.into())
                .trim_end_matches('/')
                .to_string(),
            api_key: require_env("GOOGLE_API_KEY")?,
            client: http_client()?,
        })
    }

    fn build_body(&self, req: &ChatRequest) -> Value {
        let mut system_parts: Vec<Value> = Vec::new();
        let mut contents: Vec<Value> = Vec::new();

        for msg in &req.messages {
            match msg.role {
                Role::System => system_parts.push(serde_json::json!({"text": msg.content.text()})),
                Role::User => contents.push(serde_json::json!({
                    "role": "user",
                    "parts": content_to_gemini(&msg.content),
                })),
                Role::Assistant => contents.push(serde_json::json!({
                    "role": "model",
                    "parts": content_to_gemini(&msg.content),
                })),
            }
        }

        let mut body = serde_json::json!({ "contents": contents });
        if !system_parts.is_empty() {
            body["systemInstruction"] = serde_json::json!({"parts": system_parts});
        }
        if !req.tools.is_empty() {
            let declarations: Vec<Value> = req
                .tools
                .iter()
                .map(|t: &ToolDefinition| {
                    serde_json::json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    })
                })
                .collect();
            body["tools"] = serde_json::json!([{"functionDeclarations": declarations}]);
        }

        let mut generation_config = serde_json::Map::new();
        if let Some(temp) = req.temperature {
            generation_config.insert("temperature".into(), serde_json::json!(temp));
        }
        if let Some(max) = req.max_tokens {
            generation_config.insert("maxOutputTokens".into(), serde_json::json!(max));
        }
        if let Some(spec) = &req.structured {
            generation_config.insert("responseMimeType".into(), "application/json".into());
            generation_config.insert("responseSchema".into(), spec.schema.clone());
        }
        if !generation_config.is_empty() {
            body["generationConfig"] = Value::Object(generation_config);
        }

        body
    }
}

fn content_to_gemini(content: &MessageContent) -> Value {
    match content {
        MessageContent::Text(t) => serde_json::json!([{"text": t}]),
        MessageContent::Parts(parts) => Value::Array(
            parts
                .iter()
                .map(|p| match p {
                    ContentPart::Text { text } => serde_json::json!({"text": text}),
                    ContentPart::Image { data, media_type } => serde_json::json!({
                        "inlineData": {"mimeType": media_type, "data": data}
                    }),
                })
                .collect(),
        ),
    }
}

fn parse_response(body: &Value, structured_requested: bool) -> Result<LlmResponse> {
    let empty = Vec::new();
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let mut text_parts: Vec<String> = Vec::new();
    let mut reasoning_parts: Vec<String> = Vec::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();

    for part in parts {
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            if part.get("thought").and_then(Value::as_bool).unwrap_or(false) {
                reasoning_parts.push(text.to_string());
            } else {
                text_parts.push(text.to_string());
            }
        }
        if let Some(call) = part.get("functionCall") {
            tool_calls.push(ToolCall {
                tool: call
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                args: call
                    .get("args")
                    .cloned()
                    .unwrap_or(Value::Object(Default::default())),
            });
        }
    }

    let content = text_parts.join("");
    let structured = if structured_requested && !content.is_empty() {
        serde_json::from_str(&content).ok()
    } else {
        None
    };

    let usage = body
        .get("usageMetadata")
        .map(|u| {
            TokenUsage::new(
                u.get("promptTokenCount").and_then(Value::as_u64).unwrap_or(0),
                u.get("candidatesTokenCount").and_then(Value::as_u64).unwrap_or(0),
            )
        })
        .unwrap_or_default();

    Ok(LlmResponse {
        content,
        reasoning: if reasoning_parts.is_empty() {
            None
        } else {
            Some(reasoning_parts.join(" "))
        },
        structured,
        tool_calls,
        usage,
    })
}

fn classify_error(status: reqwest::StatusCode, body: &str) -> Error {
    let message = format!("HTTP {} - {}", status.as_u16(), body);
    if status.as_u16() == 429 || body.contains("RESOURCE_EXHAUSTED") {
        Error::Throttled {
            provider: "google".into(),
            message,
        }
    } else {
        Error::Provider {
            provider: "google".into(),
            message,
        }
    }
}

#[async_trait::async_trait]
impl ChatProvider for GoogleProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<LlmResponse> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model_name, self.api_key
        );
        let body = self.build_body(req);

        tracing::debug!(model = %self.model_name, "gemini chat request");

        let resp = self
            .client
            .post(&url)
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
        parse_response(&resp_json, req.structured.is_some())
    }

    fn id(&self) -> &str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn separates_thought_parts_from_content() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "hmm", "thought": true},
                    {"text": "{\"id\": 2, \"explanation\": \"x\"}"}
                ]}
            }],
            "usageMetadata": {"promptTokenCount": 5, "candidatesTokenCount": 7}
        });
        let resp = parse_response(&body, true).unwrap();
        assert_eq!(resp.reasoning.as_deref(), Some("hmm"));
        assert_eq!(resp.structured.unwrap()["id"], 2);
        assert_eq!(resp.usage, TokenUsage::new(5, 7));
    }

    #[test]
    fn function_calls_become_tool_calls() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [
                    {"functionCall": {"name": "ClickTool", "args": {"id": 9}}}
                ]}
            }]
        });
        let resp = parse_response(&body, false).unwrap();
        assert_eq!(resp.tool_calls[0].tool, "ClickTool");
        assert_eq!(resp.tool_calls[0].args, json!({"id": 9}));
    }

    #[test]
    fn resource_exhausted_is_transient() {
        let err = classify_error(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            r#"{"error": {"status": "RESOURCE_EXHAUSTED"}}"#,
        );
        assert!(err.is_transient());
    }
}
