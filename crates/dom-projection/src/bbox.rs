//! Stage 6: bounding-box containment filtering (§4.1 step 6).
//!
//! Propagates "propagating" parents (`<a>`, `<button>`, `input[role=combobox]`,
//! `span[role=button]`) down the tree. A descendant whose bounds are ≥99%
//! contained in the propagated parent's bounds is marked `excluded_by_parent`
//! unless it is exempt.

use crate::model::{Bounds, SimplifiedNode};

const CONTAINMENT_THRESHOLD: f64 = 0.99;

const FORM_CONTROL_TAGS: &[&str] = &["input", "label", "select", "textarea"];

const INTERACTIVE_ROLES: &[&str] = &[
    "button",
    "checkbox",
    "combobox",
    "link",
    "menuitem",
    "option",
    "radio",
    "search",
    "searchbox",
    "slider",
    "spinbutton",
    "tab",
    "textbox",
];

const EXPLICIT_HANDLER_ATTRS: &[&str] =
    &["onclick", "onkeydown", "onkeyup", "onmousedown", "onmouseup", "tabindex"];

pub fn apply(root: &mut SimplifiedNode) {
    walk(root, None);
}

fn walk(node: &mut SimplifiedNode, propagated: Option<Bounds>) {
    if let (Some(parent_bounds), Some(own_bounds)) = (propagated, node.bounds) {
        if !is_propagating(node)
            && own_bounds.containment_ratio(&parent_bounds) >= CONTAINMENT_THRESHOLD
            && !is_exempt(node)
        {
            node.excluded_by_parent = true;
        }
    }

    let next_propagated = if is_propagating(node) {
        node.bounds
    } else {
        propagated
    };

    for child in &mut node.children {
        walk(child, next_propagated);
    }
}

fn is_propagating(node: &SimplifiedNode) -> bool {
    match node.tag_name.as_str() {
        "a" | "button" => true,
        "input" => node.attributes.get("role").map(|r| r == "combobox").unwrap_or(false),
        "span" => node.attributes.get("role").map(|r| r == "button").unwrap_or(false),
        _ => false,
    }
}

fn is_exempt(node: &SimplifiedNode) -> bool {
    if FORM_CONTROL_TAGS.contains(&node.tag_name.as_str()) {
        return true;
    }
    if is_propagating(node) {
        return true;
    }
    if EXPLICIT_HANDLER_ATTRS.iter().any(|attr| node.attributes.contains_key(*attr)) {
        return true;
    }
    if node
        .attributes
        .get("aria-label")
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
    {
        return true;
    }
    if let Some(role) = node.attributes.get("role") {
        if INTERACTIVE_ROLES.contains(&role.as_str()) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulbrowser_core_types::BackendNodeId;
    use std::collections::BTreeMap;

    fn node(tag: &str, bounds: Bounds) -> SimplifiedNode {
        SimplifiedNode {
            backend_node_id: BackendNodeId(1),
            tag_name: tag.to_string(),
            attributes: BTreeMap::new(),
            text: None,
            children: Vec::new(),
            virtual_children: Vec::new(),
            bounds: Some(bounds),
            should_display: true,
            is_interactive: false,
            is_scrollable: false,
            excluded_by_parent: false,
            ignored_by_paint_order: false,
            is_shadow_host: false,
            is_compound_component: false,
            scroll_info: None,
            format_hint: None,
            paint_order: None,
            opacity: None,
            transparent_background: false,
            is_real_button: false,
            is_clickable: false,
            cursor: None,
            ax_role: None,
            ax_properties: Default::default(),
            ax_ignored: false,
        }
    }

    #[test]
    fn excludes_span_fully_inside_anchor() {
        let span = node("span", Bounds { x: 1.0, y: 1.0, width: 98.0, height: 18.0 });
        let mut anchor = node("a", Bounds { x: 0.0, y: 0.0, width: 100.0, height: 20.0 });
        anchor.children = vec![span];

        apply(&mut anchor);

        assert!(anchor.children[0].excluded_by_parent);
    }

    #[test]
    fn form_control_inside_button_is_exempt() {
        let input = node("input", Bounds { x: 1.0, y: 1.0, width: 98.0, height: 18.0 });
        let mut button = node("button", Bounds { x: 0.0, y: 0.0, width: 100.0, height: 20.0 });
        button.children = vec![input];

        apply(&mut button);

        assert!(!button.children[0].excluded_by_parent);
    }

    #[test]
    fn element_with_meaningful_aria_label_is_exempt() {
        let mut labeled = node("span", Bounds { x: 1.0, y: 1.0, width: 98.0, height: 18.0 });
        labeled.attributes.insert("aria-label".to_string(), "Close dialog".to_string());
        let mut anchor = node("a", Bounds { x: 0.0, y: 0.0, width: 100.0, height: 20.0 });
        anchor.children = vec![labeled];

        apply(&mut anchor);

        assert!(!anchor.children[0].excluded_by_parent);
    }
}
