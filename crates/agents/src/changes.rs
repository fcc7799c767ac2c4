//! The ChangesAnalyzer: summarizes a structural tree diff as one
//! human-readable line.

use std::path::Path;
use std::sync::Arc;

use nv_domain::chat::Message;
use nv_domain::error::Result;
use nv_domain::usage::TokenUsage;
use nv_providers::{ChatRequest, Llm};

use crate::base::AgentCore;
use crate::prompt::{self, fill, AgentKind};

pub struct ChangesAnalyzerAgent {
    core: AgentCore,
    llm: Arc<Llm>,
    system: String,
    user_template: String,
}

impl ChangesAnalyzerAgent {
    pub fn new(llm: Arc<Llm>, prompt_dir: Option<&Path>) -> Self {
        let prompts = prompt::load(AgentKind::ChangesAnalyzer, llm.model().provider, prompt_dir);
        Self {
            core: AgentCore::new("changes_analyzer"),
            llm,
            system: prompts.system,
            user_template: prompts.user,
        }
    }

    /// Summarize a diff as a single line.
    pub async fn invoke(&self, diff: &str) -> Result<String> {
        tracing::info!("analyzing changes");

        let request = ChatRequest {
            messages: vec![
                Message::system(self.system.clone()),
                Message::user(fill(&self.user_template, &[("diff", diff)])),
            ],
            ..Default::default()
        };

        let response = self.llm.invoke(&request).await?;
        self.core.record(&response);

        Ok(response.content.replace("\n\n", " "))
    }

    pub fn usage(&self) -> TokenUsage {
        self.core.usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nv_domain::model::{Model, Provider};
    use nv_providers::testing::MockProvider;
    use nv_providers::{LlmResponse, ResponseCache};

    #[tokio::test]
    async fn collapses_paragraph_breaks() {
        let mock = Arc::new(MockProvider::new());
        mock.push(LlmResponse {
            content: "The button changed.\n\nIt now reads Submit.".into(),
            usage: TokenUsage::new(12, 6),
            ..Default::default()
        });
        let llm = Arc::new(Llm::with_provider(
            Model::new(Provider::Openai, None),
            mock,
            Arc::new(ResponseCache::in_memory()),
        ));
        let agent = ChangesAnalyzerAgent::new(llm, None);

        let summary = agent.invoke("- a\n+ b\n").await.unwrap();
        assert_eq!(summary, "The button changed. It now reads Submit.");
    }
}
