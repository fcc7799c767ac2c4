//! Mobile accessibility-tree parsers (XCUITest and UiAutomator2).
//!
//! Input is the driver page-source XML. Geometry and bookkeeping
//! attributes are dropped; only the attributes a model can act on are kept.
//! Raw ids come from the platform's identifier attribute when present,
//! otherwise the element's opaque id doubles as the raw id.

use serde_json::Value;

use nv_domain::error::{Error, Result};

use crate::node::{prune_root, Node};

/// Attributes kept for XCUITest elements, rendered under the same name.
const XCUITEST_ATTRS: [&str; 5] = ["name", "label", "value", "title", "placeholderValue"];

/// Attributes kept for UiAutomator2 elements.
const UIAUTOMATOR2_ATTRS: [&str; 4] = ["text", "content-desc", "resource-id", "hint"];

/// State flags kept on both platforms when they differ from the default.
const STATE_FLAGS: [(&str, &str); 7] = [
    ("enabled", "false"),
    ("checked", "true"),
    ("selected", "true"),
    ("focused", "true"),
    ("scrollable", "true"),
    ("password", "true"),
    ("clickable", "true"),
];

pub fn parse_xcuitest(raw: &str) -> Result<Node> {
    let root = parse_xml(raw, &XCUITEST_ATTRS, &["name", "uid", "id"])?;
    Ok(prune_root(root, &|role| role == "XCUIElementTypeOther"))
}

pub fn parse_uiautomator2(raw: &str) -> Result<Node> {
    let root = parse_xml(raw, &UIAUTOMATOR2_ATTRS, &["uid", "id", "resource-id"])?;
    Ok(prune_root(root, &is_android_layout))
}

fn is_android_layout(role: &str) -> bool {
    role.ends_with("Layout")
        || role == "android.view.View"
        || role == "android.view.ViewGroup"
        || role == "hierarchy"
}

fn parse_xml(raw: &str, keep_attrs: &[&str], id_attrs: &[&str]) -> Result<Node> {
    let doc = roxmltree::Document::parse(raw)
        .map_err(|e| Error::Tree(format!("malformed accessibility XML: {e}")))?;
    Ok(convert(doc.root_element(), keep_attrs, id_attrs))
}

fn convert(element: roxmltree::Node<'_, '_>, keep_attrs: &[&str], id_attrs: &[&str]) -> Node {
    let mut node = Node::new(element.tag_name().name());

    for attr in keep_attrs {
        if let Some(value) = element.attribute(*attr) {
            node.set_attr(attr, value);
        }
    }
    for (flag, interesting) in STATE_FLAGS {
        if element.attribute(flag) == Some(interesting) {
            node.set_attr(flag, interesting);
        }
    }
    node.raw_id = id_attrs
        .iter()
        .find_map(|attr| element.attribute(*attr))
        .filter(|v| !v.is_empty())
        .map(|v| Value::String(v.to_string()));

    node.children = element
        .children()
        .filter(|child| child.is_element())
        .map(|child| convert(child, keep_attrs, id_attrs))
        .collect();
    node
}
