//! The Actor: turns one plan step into concrete tool calls referencing
//! opaque element ids.

use std::path::Path;
use std::sync::Arc;

use nv_domain::chat::Message;
use nv_domain::error::Result;
use nv_domain::tool::{ToolCall, ToolDefinition};
use nv_domain::usage::TokenUsage;
use nv_providers::{ChatRequest, Llm};

use crate::base::AgentCore;
use crate::prompt::{self, fill, AgentKind};

pub struct ActorAgent {
    core: AgentCore,
    llm: Arc<Llm>,
    system: String,
    user_template: String,
    tools: Vec<ToolDefinition>,
}

impl ActorAgent {
    pub fn new(llm: Arc<Llm>, tools: Vec<ToolDefinition>, prompt_dir: Option<&Path>) -> Self {
        let prompts = prompt::load(AgentKind::Actor, llm.model().provider, prompt_dir);
        Self {
            core: AgentCore::new("actor"),
            llm,
            system: prompts.system,
            user_template: prompts.user,
            tools,
        }
    }

    /// Emit tool calls for one step. An empty or whitespace step produces
    /// no calls and touches no model.
    pub async fn invoke(
        &self,
        goal: &str,
        step: &str,
        accessibility_tree_xml: &str,
    ) -> Result<(String, Vec<ToolCall>)> {
        if step.trim().is_empty() {
            return Ok((String::new(), Vec::new()));
        }

        tracing::info!(goal, step, "acting");

        let request = ChatRequest {
            messages: vec![
                Message::system(self.system.clone()),
                Message::user(fill(
                    &self.user_template,
                    &[
                        ("goal", goal),
                        ("step", step),
                        ("accessibility_tree", accessibility_tree_xml),
                    ],
                )),
            ],
            tools: self.tools.clone(),
            ..Default::default()
        };

        let response = self.llm.invoke(&request).await?;
        self.core.record(&response);

        tracing::debug!(tool_calls = response.tool_calls.len(), "actor done");
        Ok((
            response.reasoning.unwrap_or_default(),
            response.tool_calls,
        ))
    }

    pub fn usage(&self) -> TokenUsage {
        self.core.usage()
    }
}
