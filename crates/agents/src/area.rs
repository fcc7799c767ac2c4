//! The Area agent: picks the element whose subtree matches a described
//! screen area, used to narrow subsequent calls.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use nv_domain::chat::Message;
use nv_domain::error::{Error, Result};
use nv_domain::usage::TokenUsage;
use nv_providers::{ChatRequest, Llm, StructuredSpec};

use crate::base::AgentCore;
use crate::prompt::{self, fill, AgentKind};

#[derive(Debug, Deserialize)]
struct Area {
    #[serde(default)]
    explanation: String,
    id: u64,
}

pub struct AreaAgent {
    core: AgentCore,
    llm: Arc<Llm>,
    system: String,
    user_template: String,
}

impl AreaAgent {
    pub fn new(llm: Arc<Llm>, prompt_dir: Option<&Path>) -> Self {
        let prompts = prompt::load(AgentKind::Area, llm.model().provider, prompt_dir);
        Self {
            core: AgentCore::new("area"),
            llm,
            system: prompts.system,
            user_template: prompts.user,
        }
    }

    /// Returns `(opaque id, explanation)` of the matching area.
    pub async fn invoke(
        &self,
        description: &str,
        accessibility_tree_xml: &str,
    ) -> Result<(u64, String)> {
        tracing::info!(description, "locating area");

        let request = ChatRequest {
            messages: vec![
                Message::system(self.system.clone()),
                Message::user(fill(
                    &self.user_template,
                    &[
                        ("accessibility_tree", accessibility_tree_xml),
                        ("description", description),
                    ],
                )),
            ],
            structured: Some(area_spec()),
            ..Default::default()
        };

        let response = self.llm.invoke(&request).await?;
        self.core.record(&response);

        let area: Area = response
            .structured
            .map(serde_json::from_value)
            .transpose()?
            .ok_or_else(|| Error::Other("area agent returned no structured value".into()))?;
        Ok((area.id, area.explanation))
    }

    pub fn usage(&self) -> TokenUsage {
        self.core.usage()
    }
}

fn area_spec() -> StructuredSpec {
    StructuredSpec {
        name: "area".into(),
        description: "Area of the accessibility tree to use.".into(),
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "explanation": {
                    "type": "string",
                    "description": "Explanation how the area was determined and why it's related to the requested information. Always include the requested information and its value in the explanation."
                },
                "id": {
                    "type": "integer",
                    "description": "Identifier of the element that corresponds to the area in the accessibility tree."
                }
            },
            "required": ["explanation", "id"],
            "additionalProperties": false
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nv_domain::model::{Model, Provider};
    use nv_providers::testing::MockProvider;
    use nv_providers::{LlmResponse, ResponseCache};

    #[tokio::test]
    async fn returns_id_and_explanation() {
        let mock = Arc::new(MockProvider::new());
        mock.push(LlmResponse {
            structured: Some(serde_json::json!({"id": 14, "explanation": "the list"})),
            usage: TokenUsage::new(8, 2),
            ..Default::default()
        });
        let llm = Arc::new(Llm::with_provider(
            Model::new(Provider::Openai, None),
            mock,
            Arc::new(ResponseCache::in_memory()),
        ));
        let agent = AreaAgent::new(llm, None);

        let (id, explanation) = agent.invoke("todo list", "<root />").await.unwrap();
        assert_eq!(id, 14);
        assert_eq!(explanation, "the list");
        assert_eq!(agent.usage().total_tokens, 10);
    }
}
