//! Stage 7: interactive-index assignment (§4.1 step 7, full heuristic §11.1).
//!
//! Walks the surviving tree, marking `is_interactive` and collecting the
//! selector map. CDP's own hint is authoritative; everything else is a
//! fallback chain run when CDP stays silent.

use std::collections::BTreeMap;

use crate::model::{EnhancedDomNode, SelectorMap, SimplifiedNode};

const INTERACTIVE_TAGS: &[&str] = &[
    "a", "button", "details", "input", "optgroup", "option", "select", "summary", "textarea",
];

const ARIA_ROLE_ALLOWLIST: &[&str] = &[
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

const SEARCH_TOKENS: &[&str] = &[
    "find",
    "glass",
    "lookup",
    "magnify",
    "query",
    "search",
    "search-btn",
    "search-button",
    "search-icon",
    "searchbox",
];

const FORCE_INTERACTIVE_AX_PROPS: &[&str] = &[
    "editable",
    "focusable",
    "settable",
    "checked",
    "expanded",
    "pressed",
    "selected",
    "autocomplete",
    "required",
    "keyshortcuts",
];

/// Assigns `is_interactive` in place and returns the resulting selector map,
/// keyed by `backend_node_id`, looked up against the enhanced tree.
pub fn apply(simplified: &mut SimplifiedNode, enhanced_by_id: &BTreeMap<i64, EnhancedDomNode>) -> SelectorMap {
    let mut selector_map = SelectorMap::new();
    walk(simplified, enhanced_by_id, &mut selector_map);
    selector_map
}

fn walk(
    node: &mut SimplifiedNode,
    enhanced_by_id: &BTreeMap<i64, EnhancedDomNode>,
    selector_map: &mut SelectorMap,
) {
    for child in &mut node.children {
        walk(child, enhanced_by_id, selector_map);
    }

    let has_interactive_descendant = node.children.iter().any(|c| c.is_interactive);

    if is_interactive(node, has_interactive_descendant) {
        node.is_interactive = true;
        if let Some(enhanced) = enhanced_by_id.get(&node.backend_node_id.0) {
            selector_map.insert(node.backend_node_id.0, enhanced.clone());
        }
    }
}

fn is_interactive(node: &SimplifiedNode, has_interactive_descendant: bool) -> bool {
    if node.ax_ignored {
        return false;
    }
    if node.ax_properties.get("disabled").map(|v| v == "true").unwrap_or(false) {
        return is_addressable_disabled(node);
    }
    if node.ax_properties.get("hidden").map(|v| v == "true").unwrap_or(false) {
        return false;
    }

    if node.is_clickable {
        return true;
    }

    if node.tag_name == "iframe" {
        if let Some(bounds) = node.bounds {
            if bounds.width > 100.0 && bounds.height > 100.0 {
                return true;
            }
        }
    }

    if is_file_input(node) {
        return true;
    }

    if is_real_button_like(node) {
        return true;
    }

    if node.tag_name != "label" && is_interactive_tag_and_visible(node) {
        return true;
    }

    if node.is_scrollable && !has_interactive_descendant {
        return true;
    }

    if matches_search_token(node) {
        return true;
    }

    if FORCE_INTERACTIVE_AX_PROPS.iter().any(|prop| node.ax_properties.contains_key(*prop)) {
        return true;
    }

    if EXPLICIT_HANDLER_ATTRS.iter().any(|attr| node.attributes.contains_key(*attr)) {
        return true;
    }

    if role_matches_allowlist(node) {
        return true;
    }

    if is_icon_sized_interactive_candidate(node) {
        return true;
    }

    if node.cursor.as_deref() == Some("pointer") {
        return true;
    }

    false
}

fn is_addressable_disabled(node: &SimplifiedNode) -> bool {
    // Disabled buttons must stay addressable per step 7's button exception.
    node.tag_name == "button" || (node.tag_name == "input" && is_button_input(node))
}

fn is_button_input(node: &SimplifiedNode) -> bool {
    matches!(
        node.attributes.get("type").map(|v| v.as_str()),
        Some("button") | Some("submit") | Some("reset")
    )
}

fn is_file_input(node: &SimplifiedNode) -> bool {
    node.tag_name == "input" && node.attributes.get("type").map(|v| v == "file").unwrap_or(false)
}

fn is_real_button_like(node: &SimplifiedNode) -> bool {
    node.is_real_button || (node.tag_name == "input" && is_button_input(node))
}

fn is_interactive_tag_and_visible(node: &SimplifiedNode) -> bool {
    INTERACTIVE_TAGS.contains(&node.tag_name.as_str()) && node.should_display
}

fn matches_search_token(node: &SimplifiedNode) -> bool {
    let haystacks = [
        node.attributes.get("class"),
        node.attributes.get("id"),
    ];
    let data_attrs = node.attributes.iter().filter(|(k, _)| k.starts_with("data-"));

    haystacks
        .into_iter()
        .flatten()
        .chain(data_attrs.map(|(_, v)| v))
        .any(|value| {
            let lower = value.to_ascii_lowercase();
            SEARCH_TOKENS.iter().any(|token| lower.contains(token))
        })
}

fn role_matches_allowlist(node: &SimplifiedNode) -> bool {
    let role_attr = node.attributes.get("role").map(|v| v.as_str());
    let ax_role = node.ax_role.as_deref();
    [role_attr, ax_role]
        .into_iter()
        .flatten()
        .any(|role| ARIA_ROLE_ALLOWLIST.contains(&role))
}

fn is_icon_sized_interactive_candidate(node: &SimplifiedNode) -> bool {
    let bounds = match node.bounds {
        Some(b) => b,
        None => return false,
    };
    let icon_sized = (10.0..=50.0).contains(&bounds.width) && (10.0..=50.0).contains(&bounds.height);
    if !icon_sized {
        return false;
    }
    node.attributes.get("aria-label").map(|v| !v.is_empty()).unwrap_or(false)
        || node.attributes.get("class").map(|v| !v.is_empty()).unwrap_or(false)
        || node.attributes.contains_key("data-action")
        || node.attributes.contains_key("onclick")
        || node.attributes.contains_key("role")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Bounds;
    use soulbrowser_core_types::BackendNodeId;

    fn node(tag: &str) -> SimplifiedNode {
        SimplifiedNode {
            backend_node_id: BackendNodeId(1),
            tag_name: tag.to_string(),
            attributes: Default::default(),
            text: None,
            children: Vec::new(),
            virtual_children: Vec::new(),
            bounds: None,
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
            is_real_button: tag == "button",
            is_clickable: false,
            cursor: None,
            ax_role: None,
            ax_properties: Default::default(),
            ax_ignored: false,
        }
    }

    #[test]
    fn label_tag_is_never_interactive_by_tag_alone() {
        let label = node("label");
        assert!(!is_interactive(&label, false));
    }

    #[test]
    fn button_tag_is_interactive_when_visible() {
        let button = node("button");
        assert!(is_interactive(&button, false));
    }

    #[test]
    fn disabled_button_remains_addressable() {
        let mut button = node("button");
        button.ax_properties.insert("disabled".to_string(), "true".to_string());
        assert!(is_interactive(&button, false));
    }

    #[test]
    fn icon_sized_div_with_aria_label_is_interactive() {
        let mut div = node("div");
        div.bounds = Some(Bounds { x: 0.0, y: 0.0, width: 24.0, height: 24.0 });
        div.attributes.insert("aria-label".to_string(), "Close".to_string());
        assert!(is_interactive(&div, false));
    }

    #[test]
    fn plain_div_is_not_interactive() {
        let div = node("div");
        assert!(!is_interactive(&div, false));
    }

    #[test]
    fn search_icon_class_forces_interactive() {
        let mut span = node("span");
        span.attributes.insert("class".to_string(), "icon-search-btn".to_string());
        assert!(is_interactive(&span, false));
    }

    #[test]
    fn large_iframe_is_interactive() {
        let mut iframe = node("iframe");
        iframe.bounds = Some(Bounds { x: 0.0, y: 0.0, width: 400.0, height: 300.0 });
        assert!(is_interactive(&iframe, false));
    }

    #[test]
    fn cursor_pointer_fallback() {
        let mut div = node("div");
        div.cursor = Some("pointer".to_string());
        assert!(is_interactive(&div, false));
    }

    #[test]
    fn scrollable_without_interactive_descendant_is_interactive() {
        let mut div = node("div");
        div.is_scrollable = true;
        assert!(is_interactive(&div, false));
        assert!(!is_interactive(&div, true));
    }
}
