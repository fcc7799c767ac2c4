//! The processed, request-scoped accessibility tree.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use nv_domain::error::{Error, Result};
use nv_domain::tool::ToolCall;

use crate::node::{escape_attr, Node};
use crate::{chromium, mobile};

/// The UI platform a session drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Chromium,
    Xcuitest,
    Uiautomator2,
}

impl std::str::FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chromium" => Ok(Platform::Chromium),
            "xcuitest" => Ok(Platform::Xcuitest),
            "uiautomator2" => Ok(Platform::Uiautomator2),
            other => Err(Error::UnknownPlatform(other.to_string())),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Platform::Chromium => "chromium",
            Platform::Xcuitest => "xcuitest",
            Platform::Uiautomator2 => "uiautomator2",
        };
        f.write_str(tag)
    }
}

/// A processed accessibility tree: pruned nodes with dense opaque ids and a
/// total bidirectional map between opaque and raw driver ids.
///
/// Lives for a single request; never cached across requests.
#[derive(Debug, Clone)]
pub struct AccessibilityTree {
    root: Node,
    opaque_to_raw: HashMap<u64, Value>,
    raw_to_opaque: HashMap<String, u64>,
}

impl AccessibilityTree {
    /// Parse a raw platform dump into a processed tree.
    pub fn parse(platform: Platform, raw: &str) -> Result<Self> {
        let root = match platform {
            Platform::Chromium => chromium::parse(raw)?,
            Platform::Xcuitest => mobile::parse_xcuitest(raw)?,
            Platform::Uiautomator2 => mobile::parse_uiautomator2(raw)?,
        };
        Ok(Self::from_root(root))
    }

    /// Assign opaque ids in document order starting at 1 and record the
    /// id maps. Nodes without a platform identifier use their opaque id as
    /// the raw id so the mapping stays total in both directions.
    fn from_root(mut root: Node) -> Self {
        let mut opaque_to_raw = HashMap::new();
        let mut raw_to_opaque = HashMap::new();
        let mut next_id = 1u64;
        assign_ids(&mut root, &mut next_id, &mut opaque_to_raw, &mut raw_to_opaque);
        Self {
            root,
            opaque_to_raw,
            raw_to_opaque,
        }
    }

    /// Canonical XML rendering with the opaque `id` attribute on every
    /// element. This is the model input.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        render(&self.root, &mut out, 0, true);
        out
    }

    /// Rendering without `id` attributes, used by the diff engine so that
    /// renumbering between runs does not break structural equality.
    pub fn to_xml_without_ids(&self) -> String {
        let mut out = String::new();
        render(&self.root, &mut out, 0, false);
        out
    }

    /// Raw driver id for an opaque id. Unknown ids are a programming error
    /// surfaced to the caller.
    pub fn raw_id(&self, opaque: u64) -> Result<Value> {
        self.opaque_to_raw
            .get(&opaque)
            .cloned()
            .ok_or(Error::UnknownId(opaque))
    }

    /// Opaque id for a raw driver id, when the element is in this tree.
    pub fn opaque_id(&self, raw: &Value) -> Option<u64> {
        self.raw_to_opaque.get(&raw_key(raw)).copied()
    }

    pub fn len(&self) -> usize {
        self.opaque_to_raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opaque_to_raw.is_empty()
    }

    /// A new tree rooted at the subtree containing `opaque`, preserving the
    /// original opaque ids and their raw mappings.
    pub fn scope_to_area(&self, opaque: u64) -> Result<AccessibilityTree> {
        let subtree = find(&self.root, opaque)
            .cloned()
            .ok_or(Error::UnknownId(opaque))?;

        let mut opaque_to_raw = HashMap::new();
        let mut raw_to_opaque = HashMap::new();
        collect_ids(&subtree, &self.opaque_to_raw, &mut opaque_to_raw, &mut raw_to_opaque);
        Ok(AccessibilityTree {
            root: subtree,
            opaque_to_raw,
            raw_to_opaque,
        })
    }

    /// Rewrite opaque ids in tool-call arguments back to raw driver ids.
    ///
    /// Fields named `id` or ending in `_id` whose value is an integer are
    /// treated as id-typed; everything else is left untouched. An id-typed
    /// integer that is not a known opaque id is an error.
    pub fn map_tool_calls_to_raw_id(&self, calls: &[ToolCall]) -> Result<Vec<ToolCall>> {
        calls
            .iter()
            .map(|call| {
                let mut mapped = call.clone();
                if let Some(args) = mapped.args.as_object_mut() {
                    for (field, value) in args.iter_mut() {
                        if !is_id_field(field) {
                            continue;
                        }
                        if let Some(opaque) = value.as_u64() {
                            *value = self.raw_id(opaque)?;
                        }
                    }
                }
                Ok(mapped)
            })
            .collect()
    }
}

fn is_id_field(name: &str) -> bool {
    name == "id" || name.ends_with("_id")
}

fn raw_key(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn assign_ids(
    node: &mut Node,
    next_id: &mut u64,
    opaque_to_raw: &mut HashMap<u64, Value>,
    raw_to_opaque: &mut HashMap<String, u64>,
) {
    node.id = *next_id;
    *next_id += 1;

    let raw = node
        .raw_id
        .clone()
        .unwrap_or_else(|| Value::Number(node.id.into()));
    raw_to_opaque.entry(raw_key(&raw)).or_insert(node.id);
    opaque_to_raw.insert(node.id, raw);

    for child in &mut node.children {
        assign_ids(child, next_id, opaque_to_raw, raw_to_opaque);
    }
}

fn find<'a>(node: &'a Node, opaque: u64) -> Option<&'a Node> {
    if node.id == opaque {
        return Some(node);
    }
    node.children.iter().find_map(|child| find(child, opaque))
}

fn collect_ids(
    node: &Node,
    source: &HashMap<u64, Value>,
    opaque_to_raw: &mut HashMap<u64, Value>,
    raw_to_opaque: &mut HashMap<String, u64>,
) {
    if let Some(raw) = source.get(&node.id) {
        opaque_to_raw.insert(node.id, raw.clone());
        raw_to_opaque.entry(raw_key(raw)).or_insert(node.id);
    }
    for child in &node.children {
        collect_ids(child, source, opaque_to_raw, raw_to_opaque);
    }
}

/// Render one node. The `id` attribute (when included) always comes first;
/// remaining attributes are in sorted order, so output is deterministic.
fn render(node: &Node, out: &mut String, depth: usize, include_ids: bool) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push('<');
    out.push_str(&node.role);
    if include_ids {
        out.push_str(&format!(" id=\"{}\"", node.id));
    }
    for (name, value) in &node.attrs {
        out.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
    }
    if node.children.is_empty() {
        out.push_str(" />\n");
        return;
    }
    out.push_str(">\n");
    for child in &node.children {
        render(child, out, depth + 1, include_ids);
    }
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(&format!("</{}>\n", node.role));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tree() -> AccessibilityTree {
        let raw = json!({
            "nodes": [
                {
                    "nodeId": "root-1",
                    "role": {"value": "RootWebArea"},
                    "name": {"value": "App"},
                    "childIds": ["f-2", "b-3"]
                },
                {
                    "nodeId": "f-2",
                    "role": {"value": "textbox"},
                    "name": {"value": "Search"}
                },
                {
                    "nodeId": "b-3",
                    "role": {"value": "button"},
                    "name": {"value": "Go"}
                }
            ]
        })
        .to_string();
        AccessibilityTree::parse(Platform::Chromium, &raw).unwrap()
    }

    #[test]
    fn assigns_dense_ids_in_document_order() {
        let tree = sample_tree();
        assert_eq!(tree.raw_id(1).unwrap(), json!("root-1"));
        assert_eq!(tree.raw_id(2).unwrap(), json!("f-2"));
        assert_eq!(tree.raw_id(3).unwrap(), json!("b-3"));
        assert_eq!(tree.opaque_id(&json!("b-3")), Some(3));
        assert!(matches!(tree.raw_id(99), Err(Error::UnknownId(99))));
    }

    #[test]
    fn rendering_is_deterministic() {
        let tree = sample_tree();
        assert_eq!(tree.to_xml(), tree.to_xml());
        let xml = tree.to_xml();
        assert!(xml.contains(r#"<RootWebArea id="1" name="App">"#));
        assert!(xml.contains(r#"<button id="3" name="Go" />"#));
    }

    #[test]
    fn id_less_rendering_omits_ids() {
        let tree = sample_tree();
        let xml = tree.to_xml_without_ids();
        assert!(!xml.contains("id=\""));
        assert!(xml.contains(r#"<button name="Go" />"#));
    }

    #[test]
    fn rewrites_id_typed_fields_only() {
        let tree = sample_tree();
        let calls = vec![
            ToolCall {
                tool: "drag".into(),
                args: json!({"from_id": 2, "to_id": 3, "speed": 3}),
            },
            ToolCall {
                tool: "type".into(),
                args: json!({"id": 2, "text": "milk"}),
            },
        ];
        let mapped = tree.map_tool_calls_to_raw_id(&calls).unwrap();
        assert_eq!(mapped[0].args, json!({"from_id": "f-2", "to_id": "b-3", "speed": 3}));
        assert_eq!(mapped[1].args, json!({"id": "f-2", "text": "milk"}));
    }

    #[test]
    fn unknown_opaque_id_in_action_is_an_error() {
        let tree = sample_tree();
        let calls = vec![ToolCall {
            tool: "click".into(),
            args: json!({"id": 42}),
        }];
        assert!(tree.map_tool_calls_to_raw_id(&calls).is_err());
    }

    #[test]
    fn scoping_preserves_original_ids() {
        let tree = sample_tree();
        let area = tree.scope_to_area(3).unwrap();
        assert_eq!(area.len(), 1);
        assert_eq!(area.raw_id(3).unwrap(), json!("b-3"));
        assert!(area.raw_id(1).is_err());
        assert!(area.to_xml().contains(r#"<button id="3""#));
    }

    #[test]
    fn platform_tags_parse() {
        assert_eq!("chromium".parse::<Platform>().unwrap(), Platform::Chromium);
        assert!("webdriver".parse::<Platform>().is_err());
    }
}
