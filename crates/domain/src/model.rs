//! Model identity: a `(provider, name)` pair resolved once at startup and
//! carried by every session.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Anthropic,
    AwsAnthropic,
    Openai,
    AzureOpenai,
    Google,
    Deepseek,
    AwsMeta,
    Mistralai,
    Ollama,
    Xai,
}

impl Provider {
    /// All providers, in wire-tag order.
    pub const ALL: [Provider; 10] = [
        Provider::Anthropic,
        Provider::AwsAnthropic,
        Provider::Openai,
        Provider::AzureOpenai,
        Provider::Google,
        Provider::Deepseek,
        Provider::AwsMeta,
        Provider::Mistralai,
        Provider::Ollama,
        Provider::Xai,
    ];

    /// Wire tag, e.g. `"azure_openai"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::AwsAnthropic => "aws_anthropic",
            Provider::Openai => "openai",
            Provider::AzureOpenai => "azure_openai",
            Provider::Google => "google",
            Provider::Deepseek => "deepseek",
            Provider::AwsMeta => "aws_meta",
            Provider::Mistralai => "mistralai",
            Provider::Ollama => "ollama",
            Provider::Xai => "xai",
        }
    }

    /// Model used when the client does not name one.
    pub fn default_model_name(&self) -> &'static str {
        match self {
            Provider::Anthropic => "claude-haiku-4-5-20251001",
            Provider::AwsAnthropic => "us.anthropic.claude-haiku-4-5-20251001-v1:0",
            Provider::Openai => "gpt-4o-mini",
            Provider::AzureOpenai => "gpt-4o-mini",
            Provider::Google => "gemini-2.0-flash",
            Provider::Deepseek => "deepseek-chat",
            Provider::AwsMeta => "us.meta.llama3-2-90b-instruct-v1:0",
            Provider::Mistralai => "mistral-medium-latest",
            Provider::Ollama => "mistral-small3.1",
            Provider::Xai => "grok-3-mini",
        }
    }

    /// Providers that cannot bind an output schema. Agents talking to these
    /// fall back to separator-delimited plain text.
    pub fn supports_structured_output(&self) -> bool {
        !matches!(self, Provider::Ollama)
    }
}

impl std::str::FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Provider::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| Error::Config(format!("unknown provider: {s}")))
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete model selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub provider: Provider,
    pub name: String,
}

impl Model {
    /// Build a model, falling back to the provider default name.
    pub fn new(provider: Provider, name: Option<String>) -> Self {
        let name = name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| provider.default_model_name().to_string());
        Self { provider, name }
    }

    /// Resolve the process-wide default model from `NAVIUM_MODEL`.
    ///
    /// Accepts `"provider"` or `"provider/model-name"`. Unset defaults to
    /// the Anthropic provider with its default model.
    pub fn from_env() -> Result<Self> {
        match std::env::var("NAVIUM_MODEL") {
            Ok(spec) if !spec.is_empty() => Self::parse(&spec),
            _ => Ok(Model::new(Provider::Anthropic, None)),
        }
    }

    /// Parse a `"provider"` or `"provider/model-name"` spec.
    pub fn parse(spec: &str) -> Result<Self> {
        let (provider, name) = match spec.split_once('/') {
            Some((p, n)) => (p, Some(n.to_string())),
            None => (spec, None),
        };
        Ok(Model::new(provider.parse()?, name))
    }

    /// `"provider/name"` label used in health reporting and cache keys.
    pub fn label(&self) -> String {
        format!("{}/{}", self.provider, self.name)
    }
}
