//! AWS Bedrock adapter.
//!
//! Bedrock exposes an OpenAI-compatible chat completions endpoint
//! (`/openai/v1`) with bearer-token auth, which carries both the Anthropic
//! and Meta model families without pulling the SigV4 signing stack into the
//! dependency tree. Credentials come from `AWS_BEARER_TOKEN_BEDROCK`;
//! the region defaults to `us-east-1`.

use nv_domain::error::Result;
use nv_domain::model::Model;

use crate::openai_compat::OpenAiCompatProvider;
use crate::util::{optional_env, require_env};

pub fn build(model: &Model) -> Result<OpenAiCompatProvider> {
    let region = optional_env("AWS_REGION").unwrap_or_else(|| "us-east-1".into());
    let token = require_env("AWS_BEARER_TOKEN_BEDROCK")?;
    OpenAiCompatProvider::custom(
        "bedrock",
        model.name.clone(),
        format!("https://bedrock-runtime.{region}.amazonaws.com/openai/v1"),
        Some(token),
    )
}
