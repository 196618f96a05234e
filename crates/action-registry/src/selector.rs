//! Turns an index into the current selector map into a CSS selector the
//! `Cdp` trait's `querySelector`-based methods can resolve.
//!
//! There is no persistent DOM identifier the devtools protocol-side
//! `query`/`click`/`type_text` family accepts directly, so every index-based
//! action first synthesizes the most specific selector the node's own static
//! attributes allow, preferring an identifier that is unlikely to collide
//! with a sibling.

use dom_projection::model::{EnhancedDomNode, SelectorMap};

use crate::errors::ActionError;

pub fn resolve_index(map: &SelectorMap, index: i64) -> Result<&EnhancedDomNode, ActionError> {
    map.get(&index).ok_or(ActionError::StaleIndex(index))
}

/// Build a CSS selector that should uniquely identify `node` within its
/// document, in order of specificity: `id`, `data-testid`, `name`+tag,
/// `aria-label`+tag, `href`+tag (links), else tag+class list.
pub fn build_selector(node: &EnhancedDomNode) -> String {
    if let Some(id) = node.attr("id").filter(|v| !v.is_empty()) {
        return format!("#{}", css_escape(id));
    }
    if let Some(testid) = node.attr("data-testid").filter(|v| !v.is_empty()) {
        return format!("[data-testid=\"{}\"]", css_quote(testid));
    }
    if let Some(name) = node.attr("name").filter(|v| !v.is_empty()) {
        return format!("{}[name=\"{}\"]", node.tag_name, css_quote(name));
    }
    if let Some(label) = node.attr("aria-label").filter(|v| !v.is_empty()) {
        return format!("{}[aria-label=\"{}\"]", node.tag_name, css_quote(label));
    }
    if node.tag_name.eq_ignore_ascii_case("a") {
        if let Some(href) = node.attr("href").filter(|v| !v.is_empty()) {
            return format!("a[href=\"{}\"]", css_quote(href));
        }
    }
    if let Some(class) = node.attr("class").filter(|v| !v.is_empty()) {
        let classes: String = class
            .split_whitespace()
            .map(|c| format!(".{}", css_escape(c)))
            .collect();
        if !classes.is_empty() {
            return format!("{}{}", node.tag_name, classes);
        }
    }
    node.tag_name.clone()
}

fn css_quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn css_escape(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_string()
            } else {
                format!("\\{}", c)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_projection::model::{AxFacts, NodeType, SnapshotFacts};
    use soulbrowser_core_types::BackendNodeId;
    use std::collections::BTreeMap;

    fn node(attrs: &[(&str, &str)], tag: &str) -> EnhancedDomNode {
        let mut attributes = BTreeMap::new();
        for (k, v) in attrs {
            attributes.insert(k.to_string(), v.to_string());
        }
        EnhancedDomNode {
            backend_node_id: BackendNodeId(1),
            frame_id: None,
            node_type: NodeType::Element,
            tag_name: tag.to_string(),
            attributes,
            text: None,
            children: vec![],
            shadow_roots: vec![],
            content_document: None,
            snapshot: SnapshotFacts::default(),
            ax: AxFacts::default(),
            is_visible: true,
            is_scrollable: false,
            is_clickable: true,
        }
    }

    #[test]
    fn prefers_id_over_everything_else() {
        let n = node(&[("id", "submit-btn"), ("name", "submit")], "button");
        assert_eq!(build_selector(&n), "#submit-btn");
    }

    #[test]
    fn falls_back_to_name_attribute() {
        let n = node(&[("name", "q")], "input");
        assert_eq!(build_selector(&n), "input[name=\"q\"]");
    }

    #[test]
    fn falls_back_to_bare_tag_when_nothing_else_is_available() {
        let n = node(&[], "div");
        assert_eq!(build_selector(&n), "div");
    }
}
