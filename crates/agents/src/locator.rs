//! The Locator: finds a single element matching a natural-language
//! description.

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
struct Locator {
    #[serde(default)]
    explanation: String,
    id: u64,
}

/// A located element: opaque id plus the model's explanation.
#[derive(Debug, Clone)]
pub struct LocatedElement {
    pub id: u64,
    pub explanation: String,
}

pub struct LocatorAgent {
    core: AgentCore,
    llm: Arc<Llm>,
    system: String,
    user_template: String,
}

impl LocatorAgent {
    pub fn new(llm: Arc<Llm>, prompt_dir: Option<&Path>) -> Self {
        let prompts = prompt::load(AgentKind::Locator, llm.model().provider, prompt_dir);
        Self {
            core: AgentCore::new("locator"),
            llm,
            system: prompts.system,
            user_template: prompts.user,
        }
    }

    /// Locate elements matching the description. Currently a single best
    /// match is returned.
    pub async fn invoke(
        &self,
        description: &str,
        accessibility_tree_xml: &str,
    ) -> Result<Vec<LocatedElement>> {
        tracing::info!(description, "locating element");

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
            structured: Some(locator_spec()),
            ..Default::default()
        };

        let response = self.llm.invoke(&request).await?;
        self.core.record(&response);

        let located: Locator = response
            .structured
            .map(serde_json::from_value)
            .transpose()?
            .ok_or_else(|| Error::Other("locator agent returned no structured value".into()))?;
        Ok(vec![LocatedElement {
            id: located.id,
            explanation: located.explanation,
        }])
    }

    pub fn usage(&self) -> TokenUsage {
        self.core.usage()
    }
}

fn locator_spec() -> StructuredSpec {
    StructuredSpec {
        name: "locator".into(),
        description: "Element locator in the accessibility tree.".into(),
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "explanation": {
                    "type": "string",
                    "description": "Explanation how the element was identified and why it matches the description. Always include the description and the matching element in the explanation."
                },
                "id": {
                    "type": "integer",
                    "description": "Identifier of the element that matches the description in the accessibility tree."
                }
            },
            "required": ["explanation", "id"],
            "additionalProperties": false
        }),
    }
}
