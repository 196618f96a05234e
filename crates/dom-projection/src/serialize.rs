//! Stage 8: serialization to the compact indexed text form (§4.1 step 8).

use crate::model::SimplifiedNode;

const MAX_TEXT_LEN: usize = 40_000;
const MAX_ATTR_VALUE_LEN: usize = 100;
const TRUNCATION_MARKER: &str = "\n... [truncated]";

const ATTR_ALLOWLIST: &[&str] = &[
    "id",
    "class",
    "name",
    "type",
    "placeholder",
    "aria-label",
    "href",
    "value",
    "alt",
    "title",
    "role",
];

/// Renders `root` to the indexed text form, returning the text and whether
/// it was truncated to the character cap.
pub fn serialize(root: &SimplifiedNode) -> (String, bool) {
    let mut out = String::new();
    render(root, 0, false, &mut out);

    if out.chars().count() > MAX_TEXT_LEN {
        let truncated: String = out.chars().take(MAX_TEXT_LEN).collect();
        (format!("{truncated}{TRUNCATION_MARKER}"), true)
    } else {
        (out, false)
    }
}

fn render(node: &SimplifiedNode, depth: usize, parent_scrollable: bool, out: &mut String) {
    if node.excluded_by_parent || node.ignored_by_paint_order || !node.should_display {
        for child in &node.children {
            render(child, depth, parent_scrollable, out);
        }
        return;
    }

    let indent = "  ".repeat(depth);
    let prefix = line_prefix(node);
    let attrs = render_attrs(node);
    let text = node.text.as_deref().unwrap_or("").trim();
    let format_hint = node
        .format_hint
        .as_ref()
        .map(|f| format!(" format=\"{f}\""))
        .unwrap_or_default();
    let scroll_text = scroll_info_text(node, parent_scrollable)
        .map(|s| format!(" scroll=\"{s}\""))
        .unwrap_or_default();

    out.push_str(&indent);
    out.push_str(&prefix);
    out.push_str(&node.tag_name);
    if !attrs.is_empty() {
        out.push(' ');
        out.push_str(&attrs);
    }
    out.push_str(&format_hint);
    out.push_str(&scroll_text);
    if !text.is_empty() {
        out.push(' ');
        out.push_str(text);
    }
    for virtual_child in &node.virtual_children {
        out.push_str(&format!(" [{}", virtual_child.label));
        if let Some(value) = &virtual_child.value {
            out.push_str(&format!("={value}"));
        }
        out.push(']');
    }
    out.push('\n');

    let next_parent_scrollable = parent_scrollable || node.is_scrollable;
    for child in &node.children {
        render(child, depth + 1, next_parent_scrollable, out);
    }
}

fn line_prefix(node: &SimplifiedNode) -> String {
    if node.is_interactive {
        format!("[{}] ", node.backend_node_id.0)
    } else if node.is_shadow_host {
        // Open/closed mode isn't carried on `SimplifiedNode`; assume open,
        // the common case for automation-friendly sites.
        "|SHADOW(open)| ".to_string()
    } else if node.tag_name == "iframe" {
        "|IFRAME| ".to_string()
    } else if node.is_scrollable {
        format!("|SCROLL[{}]| ", node.backend_node_id.0)
    } else {
        String::new()
    }
}

fn render_attrs(node: &SimplifiedNode) -> String {
    ATTR_ALLOWLIST
        .iter()
        .filter_map(|key| {
            node.attributes.get(*key).map(|value| {
                let capped: String = value.chars().take(MAX_ATTR_VALUE_LEN).collect();
                format!("{key}=\"{capped}\"")
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Scroll-info text is only emitted for a scrollable node whose parent isn't
/// also scrollable, or always for body/html/iframe.
fn scroll_info_text(node: &SimplifiedNode, parent_scrollable: bool) -> Option<String> {
    let info = node.scroll_info?;
    let always = matches!(node.tag_name.as_str(), "body" | "html" | "iframe");
    if parent_scrollable && !always {
        return None;
    }
    Some(format!(
        "{:.1}↑ {:.1}↓ {:.0}%",
        info.pages_above,
        info.pages_below,
        info.pct * 100.0
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulbrowser_core_types::BackendNodeId;

    fn node(tag: &str) -> SimplifiedNode {
        SimplifiedNode {
            backend_node_id: BackendNodeId(42),
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
            is_real_button: false,
            is_clickable: false,
            cursor: None,
            ax_role: None,
            ax_properties: Default::default(),
            ax_ignored: false,
        }
    }

    #[test]
    fn interactive_node_gets_bracketed_index_prefix() {
        let mut button = node("button");
        button.is_interactive = true;
        let (text, truncated) = serialize(&button);
        assert!(text.starts_with("[42] button"));
        assert!(!truncated);
    }

    #[test]
    fn excluded_node_is_skipped_but_children_still_render() {
        let mut child = node("span");
        child.is_interactive = true;
        child.backend_node_id = BackendNodeId(7);
        let mut wrapper = node("div");
        wrapper.excluded_by_parent = true;
        wrapper.children = vec![child];

        let (text, _) = serialize(&wrapper);
        assert!(!text.contains("div"));
        assert!(text.contains("[7] span"));
    }

    #[test]
    fn caps_total_length_with_truncation_marker() {
        let mut root = node("div");
        root.children = (0..5000)
            .map(|i| {
                let mut n = node("span");
                n.backend_node_id = BackendNodeId(i);
                n.text = Some("x".repeat(50));
                n
            })
            .collect();

        let (text, truncated) = serialize(&root);
        assert!(truncated);
        assert!(text.ends_with(TRUNCATION_MARKER));
    }
}
