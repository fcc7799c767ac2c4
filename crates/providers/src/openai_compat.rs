//! OpenAI-compatible adapter.
//!
//! Serves OpenAI, Azure OpenAI, DeepSeek, MistralAI, Ollama and xAI — any
//! endpoint following the OpenAI chat completions contract. Azure uses the
//! same wire format but a different URL pattern
//! (`/openai/deployments/{model}/chat/completions`) and auth header
//! (`api-key` instead of `Authorization: Bearer`).

use serde_json::Value;

use nv_domain::chat::{ContentPart, MessageContent, Role};
use nv_domain::error::{Error, Result};
use nv_domain::model::Model;
use nv_domain::tool::{ToolCall, ToolDefinition};
use nv_domain::usage::TokenUsage;

use crate::traits::{ChatProvider, ChatRequest, LlmResponse};
use crate::util::{from_reqwest, http_client, optional_env, require_env};

const AZURE_API_VERSION: &str = "2024-10-21";

pub struct OpenAiCompatProvider {
    id: String,
    base_url: String,
    api_key: Option<String>,
    auth_header: String,
    auth_prefix: String,
    model_name: String,
    is_azure: bool,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn openai(model: &Model) -> Result<Self> {
        Self::bearer("openai", model, "https://api.openai.com/v1", Some(require_env("OPENAI_API_KEY")?))
    }

    pub fn azure(model: &Model) -> Result<Self> {
        let endpoint = require_env("AZURE_OPENAI_ENDPOINT")?;
        Ok(Self {
            id: "azure_openai".into(),
            base_url: endpoint.trim_end_matches('/').to_string(),
            api_key: Some(require_env("AZURE_OPENAI_API_KEY")?),
            auth_header: "api-key".into(),
            auth_prefix: String::new(),
            model_name: model.name.clone(),
            is_azure: true,
            client: http_client()?,
        })
    }

    pub fn deepseek(model: &Model) -> Result<Self> {
        Self::bearer("deepseek", model, "https://api.deepseek.com/v1", Some(require_env("DEEPSEEK_API_KEY")?))
    }

    pub fn mistral(model: &Model) -> Result<Self> {
        Self::bearer("mistralai", model, "https://api.mistral.ai/v1", Some(require_env("MISTRAL_API_KEY")?))
    }

    pub fn ollama(model: &Model) -> Result<Self> {
        let host = optional_env("OLLAMA_HOST").unwrap_or_else(|| "http://localhost:11434".into());
        let base = format!("{}/v1", host.trim_end_matches('/'));
        Self::bearer("ollama", model, &base, None)
    }

    pub fn xai(model: &Model) -> Result<Self> {
        Self::bearer("xai", model, "https://api.x.ai/v1", Some(require_env("XAI_API_KEY")?))
    }

    /// Arbitrary OpenAI-compatible endpoint (used for Bedrock's gateway).
    pub fn custom(
        id: impl Into<String>,
        model_name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            auth_header: "Authorization".into(),
            auth_prefix: "Bearer ".into(),
            model_name: model_name.into(),
            is_azure: false,
            client: http_client()?,
        })
    }

    fn bearer(id: &str, model: &Model, base_url: &str, api_key: Option<String>) -> Result<Self> {
        Self::custom(id, model.name.clone(), base_url, api_key)
    }

    fn chat_url(&self) -> String {
        if self.is_azure {
            format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.base_url, self.model_name, AZURE_API_VERSION
            )
        } else {
            format!("{}/chat/completions", self.base_url)
        }
    }

    fn build_body(&self, req: &ChatRequest) -> Value {
        let messages: Vec<Value> = req.messages.iter().map(|m| msg_to_openai(&m.role, &m.content)).collect();

        let mut body = serde_json::json!({ "messages": messages });

        // Azure embeds the deployment name in the URL; everyone else wants
        // the model in the body.
        if !self.is_azure {
            body["model"] = Value::String(self.model_name.clone());
        }
        if !req.tools.is_empty() {
            let tools: Vec<Value> = req.tools.iter().map(tool_to_openai).collect();
            body["tools"] = Value::Array(tools);
        }
        if let Some(spec) = &req.structured {
            body["response_format"] = serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": spec.name,
                    "description": spec.description,
                    "schema": spec.schema,
                    "strict": true,
                }
            });
        }
        if let Some(temp) = req.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        if let Some(max) = req.max_tokens {
            body["max_tokens"] = serde_json::json!(max);
        }
        body
    }
}

fn msg_to_openai(role: &Role, content: &MessageContent) -> Value {
    let role = match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    };
    let content = match content {
        MessageContent::Text(t) => Value::String(t.clone()),
        MessageContent::Parts(parts) => Value::Array(
            parts
                .iter()
                .map(|p| match p {
                    ContentPart::Text { text } => serde_json::json!({
                        "type": "text",
                        "text": text,
                    }),
                    ContentPart::Image { data, media_type } => serde_json::json!({
                        "type": "image_url",
                        "image_url": {"url": format!("data:{media_type};base64,{data}")},
                    }),
                })
                .collect(),
        ),
    };
    serde_json::json!({"role": role, "content": content})
}

fn tool_to_openai(tool: &ToolDefinition) -> Value {
    serde_json::json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

fn parse_response(body: &Value, structured_requested: bool) -> Result<LlmResponse> {
    let message = body
        .pointer("/choices/0/message")
        .ok_or_else(|| Error::Other("chat completion response has no choices".into()))?;

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    // DeepSeek-style reasoning field.
    let reasoning = message
        .get("reasoning_content")
        .and_then(Value::as_str)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    let mut tool_calls = Vec::new();
    for call in message
        .get("tool_calls")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let name = call
            .pointer("/function/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let args = call
            .pointer("/function/arguments")
            .and_then(Value::as_str)
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or(Value::Object(Default::default()));
        tool_calls.push(ToolCall { tool: name, args });
    }

    let structured = if structured_requested && !content.is_empty() {
        serde_json::from_str(&content).ok()
    } else {
        None
    };

    let usage = body
        .get("usage")
        .map(|u| {
            TokenUsage::new(
                u.get("prompt_tokens").and_then(Value::as_u64).unwrap_or(0),
                u.get("completion_tokens").and_then(Value::as_u64).unwrap_or(0),
            )
        })
        .unwrap_or_default();

    Ok(LlmResponse {
        content,
        reasoning,
        structured,
        tool_calls,
        usage,
    })
}

/// 429 and 5xx responses are transient: some providers (DeepSeek) report
/// throttling as an internal server error.
fn classify_error(id: &str, status: reqwest::StatusCode, body: &str) -> Error {
    let message = format!("HTTP {} - {}", status.as_u16(), body);
    if status.as_u16() == 429 || status.is_server_error() {
        Error::Throttled {
            provider: id.to_string(),
            message,
        }
    } else {
        Error::Provider {
            provider: id.to_string(),
            message,
        }
    }
}

#[async_trait::async_trait]
impl ChatProvider for OpenAiCompatProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<LlmResponse> {
        let url = self.chat_url();
        let body = self.build_body(req);

        tracing::debug!(provider = %self.id, model = %self.model_name, url = %url, "chat request");

        let mut request = self.client.post(&url).header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header(&self.auth_header, format!("{}{}", self.auth_prefix, key));
        }

        let resp = request.json(&body).send().await.map_err(from_reqwest)?;
        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;
        if !status.is_success() {
            return Err(classify_error(&self.id, status, &resp_text));
        }

        let resp_json: Value = serde_json::from_str(&resp_text)?;
        parse_response(&resp_json, req.structured.is_some())
    }

    fn id(&self) -> &str {
        &self.id
    }
}
