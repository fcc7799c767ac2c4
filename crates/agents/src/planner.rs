//! The Planner: turns a goal plus the current screen into an ordered list
//! of natural-language steps.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use nv_domain::chat::Message;
use nv_domain::error::{Error, Result};
use nv_domain::example::Example;
use nv_domain::tool::{prettify_tool_name, ToolDefinition};
use nv_domain::usage::TokenUsage;
use nv_providers::{ChatRequest, Llm, StructuredSpec};

use crate::base::{normalize_separators, split_separated, AgentCore, LIST_SEPARATOR, NOOP};
use crate::prompt::{self, fill, AgentKind};

/// Few-shot addendum used when the session registers a URL-navigation tool:
/// models otherwise try to click their way to a URL.
const NAVIGATE_TO_URL_EXAMPLE: &str = r#"Example:
Input:
Given the following XML accessibility tree:
```xml
<link href="http://foo.bar/baz" />
```
Outline the actions needed to achieve the following goal: open 'http://foo.bar/baz/123' URL
Output:
Explanation: In order to open URL, I am going to directly navigate to the requested URL.
Actions: ['navigate to "http://foo.bar/baz/123" URL']"#;

/// Few-shot addendum for file uploads: the upload action already handles
/// the file chooser, so no preliminary click is needed.
const UPLOAD_EXAMPLE: &str = r#"Example:
Input:
Given the following XML accessibility tree:
```xml
<button name="Choose File" />
```
Outline the actions needed to achieve the following goal: upload '/tmp/test.txt', '/tmp/image.png'
Output:
Explanation: In order to upload the file, I am going to use the upload action on the file input button.
I don't need to click the button first, as the upload action will handle that.
Actions: ['upload ["/tmp/test.txt", "/tmp/image.png"] to button "Choose File"']"#;

#[derive(Debug, Deserialize)]
struct Plan {
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    actions: Vec<String>,
}

pub struct PlannerAgent {
    core: AgentCore,
    llm: Arc<Llm>,
    system: String,
    user_template: String,
    structured: bool,
}

impl PlannerAgent {
    pub fn new(llm: Arc<Llm>, tools: &[ToolDefinition], prompt_dir: Option<&Path>) -> Self {
        let provider = llm.model().provider;
        let prompts = prompt::load(AgentKind::Planner, provider, prompt_dir);

        let tool_names: Vec<String> = tools
            .iter()
            .map(|tool| prettify_tool_name(&tool.name))
            .collect();

        let mut extra_examples = String::new();
        if tools.iter().any(|t| t.name == "NavigateToUrlTool") {
            extra_examples.push_str("\n\n");
            extra_examples.push_str(NAVIGATE_TO_URL_EXAMPLE);
        }
        if tools.iter().any(|t| t.name == "UploadTool") {
            extra_examples.push_str("\n\n");
            extra_examples.push_str(UPLOAD_EXAMPLE);
        }

        let system = fill(
            &prompts.system,
            &[
                ("separator", LIST_SEPARATOR),
                ("tools", &tool_names.join(", ")),
                ("extra_examples", &extra_examples),
            ],
        );

        Self {
            core: AgentCore::new("planner"),
            llm,
            system,
            user_template: prompts.user,
            structured: provider.supports_structured_output(),
        }
    }

    /// Plan actions to achieve a goal. Learned examples go into the
    /// few-shot slot between the system message and the live request.
    pub async fn invoke(
        &self,
        goal: &str,
        accessibility_tree_xml: &str,
        examples: &[Example],
    ) -> Result<(String, Vec<String>)> {
        tracing::info!(goal, "planning");

        let mut messages = vec![Message::system(self.system.clone())];
        for example in examples {
            messages.push(Message::user(self.user_message(&example.goal, "")));
            let reply = if self.structured {
                serde_json::to_string(&serde_json::json!({
                    "explanation": "",
                    "actions": example.actions,
                }))?
            } else {
                example.actions.join(LIST_SEPARATOR)
            };
            messages.push(Message::assistant(reply));
        }
        messages.push(Message::user(self.user_message(goal, accessibility_tree_xml)));

        let request = ChatRequest {
            messages,
            structured: self.structured.then(plan_spec),
            ..Default::default()
        };

        let response = self.llm.invoke(&request).await?;
        self.core.record(&response);

        if self.structured {
            let plan: Plan = response
                .structured
                .map(serde_json::from_value)
                .transpose()?
                .ok_or_else(|| Error::Other("planner returned no structured plan".into()))?;
            let actions = plan
                .actions
                .into_iter()
                .filter(|action| !action.trim().is_empty())
                .collect();
            Ok((plan.explanation, actions))
        } else {
            let content = normalize_separators(&response.content);
            let steps = split_separated(&content)
                .into_iter()
                .filter(|step| !step.eq_ignore_ascii_case(NOOP))
                .collect();
            Ok((String::new(), steps))
        }
    }

    fn user_message(&self, goal: &str, tree: &str) -> String {
        fill(
            &self.user_template,
            &[("goal", goal), ("accessibility_tree", tree)],
        )
    }

    pub fn usage(&self) -> TokenUsage {
        self.core.usage()
    }
}

fn plan_spec() -> StructuredSpec {
    StructuredSpec {
        name: "plan".into(),
        description: "Plan of actions to achieve a goal.".into(),
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "explanation": {
                    "type": "string",
                    "description": "Explanation how the actions were determined and why they are related to the goal. Always include the goal, actions to achieve it, and their order in the explanation."
                },
                "actions": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of actions to achieve the goal."
                }
            },
            "required": ["explanation", "actions"],
            "additionalProperties": false
        }),
    }
}
