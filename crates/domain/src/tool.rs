//! Tool schemas and tool calls.
//!
//! Clients register tools at session creation using the OpenAI function
//! format; the server validates the names, forwards the schemas to the
//! model, and hands tool calls back to the client for dispatch.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// A tool invocation emitted by the Actor. `args` holds the model-supplied
/// arguments; id-typed fields are rewritten to raw driver ids before the
/// call leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    pub args: Value,
}

/// Tool definition exposed to the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub parameters: Value,
}

fn tool_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z][A-Za-z0-9]*Tool$").unwrap())
}

/// Parse client-supplied tool schemas in the OpenAI function format:
/// `{"type": "function", "function": {"name", "description", "parameters"}}`.
///
/// Names must match `PascalCaseTool`.
pub fn parse_tool_schemas(schemas: &[Value]) -> Result<Vec<ToolDefinition>> {
    schemas
        .iter()
        .map(|schema| {
            let function = schema
                .get("function")
                .and_then(|v| v.as_object())
                .ok_or_else(|| {
                    Error::Config("tool schema missing 'function' object".into())
                })?;
            let name = function
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| Error::Config("tool schema missing 'function.name'".into()))?;
            if !tool_name_pattern().is_match(name) {
                return Err(Error::Config(format!(
                    "tool name '{name}' does not match the PascalCaseTool pattern"
                )));
            }
            Ok(ToolDefinition {
                name: name.to_string(),
                description: function
                    .get("description")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                parameters: function
                    .get("parameters")
                    .cloned()
                    .unwrap_or_else(|| serde_json::json!({"type": "object", "properties": {}})),
            })
        })
        .collect()
}

/// Human-readable tool name for prompt consumption:
/// `"NavigateToUrlTool"` -> `"navigate to url"`.
pub fn prettify_tool_name(name: &str) -> String {
    let mut pretty = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                pretty.push(' ');
            }
            pretty.push(ch.to_ascii_lowercase());
        } else {
            pretty.push(ch);
        }
    }
    pretty
        .strip_suffix(" tool")
        .map(str::to_string)
        .unwrap_or(pretty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn click_schema() -> Value {
        json!({
            "type": "function",
            "function": {
                "name": "ClickTool",
                "description": "Click an element.",
                "parameters": {
                    "type": "object",
                    "properties": {"id": {"type": "integer"}},
                    "required": ["id"]
                }
            }
        })
    }

    #[test]
    fn parses_openai_function_schema() {
        let tools = parse_tool_schemas(&[click_schema()]).unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "ClickTool");
        assert_eq!(tools[0].description, "Click an element.");
        assert!(tools[0].parameters.get("properties").is_some());
    }

    #[test]
    fn rejects_non_pascal_case_names() {
        let schema = json!({"type": "function", "function": {"name": "click_tool"}});
        assert!(parse_tool_schemas(&[schema]).is_err());
        let schema = json!({"type": "function", "function": {"name": "Click"}});
        assert!(parse_tool_schemas(&[schema]).is_err());
    }

    #[test]
    fn rejects_missing_function_object() {
        assert!(parse_tool_schemas(&[json!({"type": "function"})]).is_err());
    }

    #[test]
    fn prettifies_tool_names() {
        assert_eq!(prettify_tool_name("ClickTool"), "click");
        assert_eq!(prettify_tool_name("NavigateToUrlTool"), "navigate to url");
        assert_eq!(prettify_tool_name("DragAndDropTool"), "drag and drop");
    }
}
