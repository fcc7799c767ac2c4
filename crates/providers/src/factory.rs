//! Provider construction.
//!
//! Maps a [`Model`] to its wire adapter. API keys are resolved eagerly so a
//! missing credential fails session creation with an actionable error
//! instead of failing the first agent call.

use std::sync::Arc;

use nv_domain::error::Result;
use nv_domain::model::{Model, Provider};

use crate::anthropic::AnthropicProvider;
use crate::bedrock;
use crate::google::GoogleProvider;
use crate::openai_compat::OpenAiCompatProvider;
use crate::traits::ChatProvider;

pub fn build_provider(model: &Model) -> Result<Arc<dyn ChatProvider>> {
    let provider: Arc<dyn ChatProvider> = match model.provider {
        Provider::Anthropic => Arc::new(AnthropicProvider::new(model)?),
        Provider::AwsAnthropic | Provider::AwsMeta => Arc::new(bedrock::build(model)?),
        Provider::Openai => Arc::new(OpenAiCompatProvider::openai(model)?),
        Provider::AzureOpenai => Arc::new(OpenAiCompatProvider::azure(model)?),
        Provider::Deepseek => Arc::new(OpenAiCompatProvider::deepseek(model)?),
        Provider::Mistralai => Arc::new(OpenAiCompatProvider::mistral(model)?),
        Provider::Ollama => Arc::new(OpenAiCompatProvider::ollama(model)?),
        Provider::Xai => Arc::new(OpenAiCompatProvider::xai(model)?),
        Provider::Google => Arc::new(GoogleProvider::new(model)?),
    };
    tracing::debug!(model = %model.label(), provider = provider.id(), "provider adapter ready");
    Ok(provider)
}
