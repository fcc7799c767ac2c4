//! Internal node tree shared by all platform parsers.

use std::collections::BTreeMap;

use serde_json::Value;

/// One element of the processed accessibility tree.
///
/// `attrs` is a `BTreeMap` so rendering is deterministic: the same tree
/// always produces byte-identical XML.
#[derive(Debug, Clone)]
pub struct Node {
    /// Element name in the canonical XML (the platform role or class).
    pub role: String,
    /// Driver-native identifier, when the platform supplies one.
    pub raw_id: Option<Value>,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<Node>,
    /// Dense opaque id, assigned in document order after pruning. Zero
    /// until assignment.
    pub id: u64,
}

impl Node {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: sanitize_name(&role.into()),
            raw_id: None,
            attrs: BTreeMap::new(),
            children: Vec::new(),
            id: 0,
        }
    }

    /// Set an attribute, dropping empty values.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if !value.is_empty() {
            self.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn carries_information(&self) -> bool {
        !self.attrs.is_empty()
    }
}

/// Prune semantic noise from a subtree.
///
/// Children are pruned first; a node whose role matches the platform's
/// noise predicate and that carries no attributes is replaced by its
/// surviving children, and attribute-less leaves are dropped entirely.
/// Returns zero, one, or (for promoted containers) several nodes.
pub fn prune(mut node: Node, noise: &dyn Fn(&str) -> bool) -> Vec<Node> {
    let children = std::mem::take(&mut node.children);
    node.children = children
        .into_iter()
        .flat_map(|child| prune(child, noise))
        .collect();

    if noise(&node.role) && !node.carries_information() {
        return node.children;
    }
    if node.children.is_empty() && !node.carries_information() {
        return Vec::new();
    }
    vec![node]
}

/// Prune the children of a root node, keeping the root itself.
pub fn prune_root(mut root: Node, noise: &dyn Fn(&str) -> bool) -> Node {
    let children = std::mem::take(&mut root.children);
    root.children = children
        .into_iter()
        .flat_map(|child| prune(child, noise))
        .collect();
    root
}

/// Make an arbitrary platform role safe as an XML element name.
fn sanitize_name(role: &str) -> String {
    let mut name: String = role
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() || !name.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        name = format!("n{name}");
    }
    name
}

/// Escape an attribute value for XML output.
pub fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("&#10;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
