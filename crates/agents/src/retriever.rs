//! The Retriever: answers information requests against the current screen,
//! optionally from a screenshot instead of the tree text.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use nv_domain::chat::{ContentPart, Message};
use nv_domain::error::{Error, Result};
use nv_domain::usage::TokenUsage;
use nv_providers::{ChatRequest, Llm, StructuredSpec};

use crate::base::{normalize_separators, split_separated, AgentCore, LIST_SEPARATOR};
use crate::prompt::{self, fill, AgentKind};

/// A retrieved value: a single string, or several when the model used the
/// list separator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RetrievedValue {
    Single(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct RetrievedInformation {
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    value: String,
}

pub struct RetrieverAgent {
    core: AgentCore,
    llm: Arc<Llm>,
    system: String,
    user_template: String,
    structured: bool,
}

impl RetrieverAgent {
    pub fn new(llm: Arc<Llm>, prompt_dir: Option<&Path>) -> Self {
        let provider = llm.model().provider;
        let prompts = prompt::load(AgentKind::Retriever, provider, prompt_dir);
        Self {
            core: AgentCore::new("retriever"),
            llm,
            system: fill(&prompts.system, &[("separator", LIST_SEPARATOR)]),
            user_template: prompts.user,
            structured: provider.supports_structured_output(),
        }
    }

    /// Retrieve a piece of information. When a screenshot is supplied it is
    /// attached as an image and the tree text is omitted from the prompt.
    pub async fn invoke(
        &self,
        information: &str,
        accessibility_tree_xml: &str,
        title: &str,
        url: &str,
        screenshot: Option<&str>,
    ) -> Result<(String, RetrievedValue)> {
        tracing::info!(information, "retrieving");

        let mut prompt = String::new();
        if screenshot.is_none() {
            prompt.push_str(&fill(
                &self.user_template,
                &[
                    ("accessibility_tree", accessibility_tree_xml),
                    ("title", title),
                    ("url", url),
                ],
            ));
        }
        prompt.push('\n');
        prompt.push_str(&format!("Retrieve the following information: {information}"));

        let user = match screenshot {
            None => Message::user(prompt),
            Some(shot) => Message::user_parts(vec![
                ContentPart::Text { text: prompt },
                ContentPart::Image {
                    data: shot.to_string(),
                    media_type: "image/png".into(),
                },
            ]),
        };

        let request = ChatRequest {
            messages: vec![Message::system(self.system.clone()), user],
            structured: self.structured.then(retrieval_spec),
            ..Default::default()
        };

        let response = self.llm.invoke(&request).await?;
        self.core.record(&response);

        let (explanation, raw_value) = if self.structured {
            let info: RetrievedInformation = response
                .structured
                .map(serde_json::from_value)
                .transpose()?
                .ok_or_else(|| Error::Other("retriever returned no structured value".into()))?;
            (info.explanation, info.value)
        } else {
            (String::new(), response.content)
        };

        // Separator cleanup runs on every value: models drift regardless of
        // output mode.
        let value = normalize_separators(&raw_value);
        let value = if value.contains(LIST_SEPARATOR) {
            RetrievedValue::Many(split_separated(&value))
        } else {
            RetrievedValue::Single(value)
        };
        Ok((explanation, value))
    }

    pub fn usage(&self) -> TokenUsage {
        self.core.usage()
    }
}

fn retrieval_spec() -> StructuredSpec {
    StructuredSpec {
        name: "retrieved_information".into(),
        description: "Retrieved information.".into(),
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "explanation": {
                    "type": "string",
                    "description": "Explanation how information was retrieved and why it's related to the requested information. Always include the requested information and its value in the explanation."
                },
                "value": {
                    "type": "string",
                    "description": "The precise retrieved information value without additional data. If the information is not present in context, reply NOOP."
                }
            },
            "required": ["explanation", "value"],
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

    fn retriever_with(mock: Arc<MockProvider>) -> RetrieverAgent {
        let llm = Arc::new(Llm::with_provider(
            Model::new(Provider::Anthropic, None),
            mock,
            Arc::new(ResponseCache::in_memory()),
        ));
        RetrieverAgent::new(llm, None)
    }

    fn structured(value: &str) -> LlmResponse {
        LlmResponse {
            structured: Some(serde_json::json!({
                "explanation": "found it",
                "value": value,
            })),
            usage: TokenUsage::new(15, 3),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn single_value_comes_back_as_string() {
        let mock = Arc::new(MockProvider::new());
        mock.push(structured("42"));
        let retriever = retriever_with(mock);

        let (explanation, value) = retriever
            .invoke("cart total", "<root />", "Cart", "https://e.com", None)
            .await
            .unwrap();
        assert_eq!(explanation, "found it");
        assert_eq!(value, RetrievedValue::Single("42".into()));
    }

    #[tokio::test]
    async fn separated_values_come_back_as_list() {
        let mock = Arc::new(MockProvider::new());
        mock.push(structured("a<SEP>b<SEP>c"));
        let retriever = retriever_with(mock);

        let (_, value) = retriever
            .invoke("items", "<root />", "", "", None)
            .await
            .unwrap();
        assert_eq!(
            value,
            RetrievedValue::Many(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[tokio::test]
    async fn near_miss_separators_are_repaired() {
        let mock = Arc::new(MockProvider::new());
        mock.push(structured("<SEP>a<SEP]b<SEP>"));
        let retriever = retriever_with(mock);

        let (_, value) = retriever
            .invoke("items", "<root />", "", "", None)
            .await
            .unwrap();
        assert_eq!(value, RetrievedValue::Many(vec!["a".into(), "b".into()]));
    }

    #[tokio::test]
    async fn noop_passes_through_unchanged() {
        let mock = Arc::new(MockProvider::new());
        mock.push(structured("NOOP"));
        let retriever = retriever_with(mock);

        let (_, value) = retriever
            .invoke("missing field", "<root />", "", "", None)
            .await
            .unwrap();
        assert_eq!(value, RetrievedValue::Single("NOOP".into()));
    }
}
