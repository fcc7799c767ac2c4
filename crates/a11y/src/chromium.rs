//! Chromium accessibility-tree parser.
//!
//! Input is the Chrome DevTools Protocol full-AX-tree dump: a flat node
//! list with parent/child links, either as a bare JSON array or wrapped in
//! `{"nodes": [...]}`. Ignored nodes are spliced out with their children
//! promoted; the raw id of each element is its CDP `nodeId`.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use nv_domain::error::{Error, Result};

use crate::node::{prune_root, Node};

const NOISE_ROLES: [&str; 4] = ["none", "generic", "InlineTextBox", "LineBreak"];

/// Boolean/state properties that survive into the canonical rendering.
const STATE_PROPERTIES: [&str; 12] = [
    "checked",
    "disabled",
    "expanded",
    "focused",
    "selected",
    "pressed",
    "required",
    "readonly",
    "invalid",
    "level",
    "url",
    "haspopup",
];

pub fn parse(raw: &str) -> Result<Node> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| Error::Tree(format!("malformed chromium tree JSON: {e}")))?;

    let entries = value
        .get("nodes")
        .and_then(Value::as_array)
        .or_else(|| value.as_array())
        .ok_or_else(|| Error::Tree("chromium tree has no 'nodes' array".into()))?;

    if entries.is_empty() {
        return Err(Error::Tree("chromium tree is empty".into()));
    }

    let by_id: HashMap<String, &Value> = entries
        .iter()
        .filter_map(|entry| entry.get("nodeId").map(|id| (id_key(id), entry)))
        .collect();

    // The root is the first entry never referenced as a child.
    let referenced: HashSet<String> = entries
        .iter()
        .filter_map(|entry| entry.get("childIds").and_then(Value::as_array))
        .flatten()
        .map(id_key)
        .collect();
    let root_entry = entries
        .iter()
        .find(|entry| {
            entry
                .get("nodeId")
                .is_some_and(|id| !referenced.contains(&id_key(id)))
        })
        .unwrap_or(&entries[0]);

    let mut visited = HashSet::new();
    let children = build(root_entry, &by_id, &mut visited);
    let root = match children {
        mut nodes if nodes.len() == 1 => nodes.remove(0),
        nodes => {
            // Ignored root: wrap the promoted children.
            let mut root = Node::new("RootWebArea");
            root.children = nodes;
            root
        }
    };

    Ok(prune_root(root, &|role| NOISE_ROLES.contains(&role)))
}

fn id_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build the subtree for one CDP entry. Ignored entries contribute their
/// children in place of themselves.
fn build(
    entry: &Value,
    by_id: &HashMap<String, &Value>,
    visited: &mut HashSet<String>,
) -> Vec<Node> {
    let node_id = match entry.get("nodeId") {
        Some(id) => id_key(id),
        None => return Vec::new(),
    };
    // Malformed dumps can contain child-id cycles.
    if !visited.insert(node_id.clone()) {
        return Vec::new();
    }

    let children: Vec<Node> = entry
        .get("childIds")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|child_id| by_id.get(&id_key(child_id)).copied())
        .flat_map(|child| build(child, by_id, visited))
        .collect();

    if entry.get("ignored").and_then(Value::as_bool).unwrap_or(false) {
        return children;
    }

    let role = entry
        .pointer("/role/value")
        .and_then(Value::as_str)
        .unwrap_or("node");
    let mut node = Node::new(role);
    node.raw_id = entry.get("nodeId").cloned();

    if let Some(name) = entry.pointer("/name/value").and_then(Value::as_str) {
        node.set_attr("name", name);
    }
    if let Some(value) = entry.pointer("/value/value") {
        node.set_attr("value", &scalar_to_string(value));
    }
    for property in entry
        .get("properties")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let Some(name) = property.get("name").and_then(Value::as_str) else {
            continue;
        };
        if !STATE_PROPERTIES.contains(&name) {
            continue;
        }
        let value = property
            .pointer("/value/value")
            .map(scalar_to_string)
            .unwrap_or_default();
        if value.is_empty() || value == "false" || value == "none" {
            continue;
        }
        node.set_attr(name, &value);
    }

    node.children = children;
    vec![node]
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
