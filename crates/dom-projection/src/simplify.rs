//! Stage 3: simplified tree construction.
//!
//! Depth-first walk of an `EnhancedDomNode` tree producing `SimplifiedNode`s,
//! keeping nodes that are visible, scrollable, shadow hosts, iframes, or
//! structurally required.

use crate::model::{EnhancedDomNode, SimplifiedNode, VirtualChild};

const SKIP_TAGS: &[&str] = &["head", "link", "meta", "script", "style", "title"];

const VALIDATION_ATTRS: &[&str] = &[
    "required",
    "pattern",
    "min",
    "max",
    "minlength",
    "maxlength",
    "aria-invalid",
    "aria-required",
];

/// Builds the simplified tree for `node`. `in_svg` is true once the walk has
/// descended past an `<svg>` tag (its descendants collapse into the `<svg>`
/// itself rather than being kept individually).
pub fn simplify(node: &EnhancedDomNode) -> Option<SimplifiedNode> {
    simplify_node(node, false)
}

fn simplify_node(node: &EnhancedDomNode, in_svg: bool) -> Option<SimplifiedNode> {
    if SKIP_TAGS.contains(&node.tag_name.as_str()) {
        return None;
    }
    if in_svg {
        return None;
    }

    let entering_svg = node.tag_name == "svg";
    let children: Vec<SimplifiedNode> = node
        .children
        .iter()
        .filter_map(|child| simplify_node(child, entering_svg))
        .collect();

    let forced_visible = has_validation_attr(node) || is_file_input(node) || node.is_clickable;
    let should_display = node.is_visible || forced_visible;

    let is_shadow_host = !node.shadow_roots.is_empty();
    let is_iframe = node.tag_name == "iframe";
    let is_compound_component = is_compound_control(node);

    let structurally_required =
        is_shadow_host || is_iframe || node.is_scrollable || !children.is_empty();

    if !should_display && !structurally_required {
        return None;
    }

    let virtual_children = if is_compound_component {
        synthesize_virtual_children(node)
    } else {
        Vec::new()
    };

    Some(SimplifiedNode {
        backend_node_id: node.backend_node_id,
        tag_name: node.tag_name.clone(),
        attributes: node.attributes.clone(),
        text: node.text.clone(),
        children,
        virtual_children,
        bounds: node.snapshot.bounds,
        should_display,
        is_interactive: false,
        is_scrollable: node.is_scrollable,
        excluded_by_parent: false,
        ignored_by_paint_order: false,
        is_shadow_host,
        is_compound_component,
        scroll_info: None,
        format_hint: format_hint_for(node),
        paint_order: node.snapshot.paint_order,
        opacity: node.snapshot.computed_styles.opacity,
        transparent_background: node.snapshot.computed_styles.is_transparent_background(),
        is_real_button: is_real_button(node),
        is_clickable: node.is_clickable,
        cursor: node.snapshot.computed_styles.cursor.clone(),
        ax_role: node.ax.role.clone(),
        ax_properties: node.ax.properties.clone(),
        ax_ignored: node.ax.ignored,
    })
    .map(|mut simplified| {
        simplified.scroll_info = scroll_info_for(node);
        simplified
    })
}

fn scroll_info_for(node: &EnhancedDomNode) -> Option<crate::model::ScrollInfo> {
    if !node.is_scrollable {
        return None;
    }
    let client = node.snapshot.client_rect?;
    let scroll = node.snapshot.scroll_rect?;
    if client.height <= 0.0 {
        return None;
    }
    let extra = (scroll.height - client.height).max(0.0);
    let pages_below = extra / client.height;
    Some(crate::model::ScrollInfo {
        pages_above: 0.0,
        pages_below,
        pct: 0.0,
    })
}

fn is_real_button(node: &EnhancedDomNode) -> bool {
    node.tag_name == "button"
        || (node.tag_name == "a" && node.attr("role") == Some("button"))
}

fn has_validation_attr(node: &EnhancedDomNode) -> bool {
    VALIDATION_ATTRS.iter().any(|attr| node.attributes.contains_key(*attr))
}

fn is_file_input(node: &EnhancedDomNode) -> bool {
    node.tag_name == "input" && node.attr("type") == Some("file")
}

fn is_compound_control(node: &EnhancedDomNode) -> bool {
    match node.tag_name.as_str() {
        "select" | "details" | "audio" | "video" => true,
        "input" => matches!(
            node.attr("type"),
            Some("range") | Some("number") | Some("color") | Some("file")
        ),
        _ => false,
    }
}

fn format_hint_for(node: &EnhancedDomNode) -> Option<String> {
    if node.tag_name != "input" {
        return None;
    }
    match node.attr("type") {
        Some("date") => Some("YYYY-MM-DD".to_string()),
        Some("datetime-local") => Some("YYYY-MM-DDTHH:MM".to_string()),
        Some("time") => Some("HH:MM".to_string()),
        Some("month") => Some("YYYY-MM".to_string()),
        Some("week") => Some("YYYY-Www".to_string()),
        _ => None,
    }
}

fn synthesize_virtual_children(node: &EnhancedDomNode) -> Vec<VirtualChild> {
    match node.tag_name.as_str() {
        "select" => synthesize_select_options(node),
        "input" => synthesize_range_like(node),
        "details" => vec![VirtualChild {
            label: if node.attributes.contains_key("open") {
                "expanded".to_string()
            } else {
                "collapsed".to_string()
            },
            value: None,
        }],
        "audio" | "video" => vec![VirtualChild {
            label: "media".to_string(),
            value: node.attr("src").map(|s| s.to_string()),
        }],
        _ => Vec::new(),
    }
}

fn synthesize_select_options(node: &EnhancedDomNode) -> Vec<VirtualChild> {
    let option_texts: Vec<String> = node
        .children
        .iter()
        .filter(|c| c.tag_name == "option")
        .map(|c| c.text.clone().unwrap_or_default())
        .collect();

    let total = option_texts.len();
    let mut virtual_children: Vec<VirtualChild> = option_texts
        .iter()
        .take(4)
        .map(|label| VirtualChild {
            label: label.clone(),
            value: None,
        })
        .collect();

    virtual_children.push(VirtualChild {
        label: format!("{} option(s) total", total),
        value: None,
    });
    virtual_children
}

fn synthesize_range_like(node: &EnhancedDomNode) -> Vec<VirtualChild> {
    let mut children = Vec::new();
    if let Some(min) = node.attr("min") {
        children.push(VirtualChild {
            label: "min".to_string(),
            value: Some(min.to_string()),
        });
    }
    if let Some(max) = node.attr("max") {
        children.push(VirtualChild {
            label: "max".to_string(),
            value: Some(max.to_string()),
        });
    }
    if let Some(value) = node.attr("value") {
        children.push(VirtualChild {
            label: "value".to_string(),
            value: Some(value.to_string()),
        });
    }
    children
}
