//! Stage 2: enhanced tree fusion.
//!
//! Merges the raw `DOM.getDocument` tree, the accessibility tree, and the
//! snapshot lookup (stage 1) into one `EnhancedDomNode` tree. Shadow roots
//! and iframe content documents are linked in as the walk descends.

use std::collections::BTreeMap;

use serde_json::Value;
use soulbrowser_core_types::BackendNodeId;

use crate::errors::ProjectionError;
use crate::model::{AxFacts, ComputedStyles, EnhancedDomNode, NodeType, SnapshotFacts};
use crate::snapshot::SnapshotLookup;

pub type AxLookup = BTreeMap<i64, AxFacts>;

/// Builds `{ backend_node_id -> AxFacts }` from a raw `Accessibility.getFullAXTree` response.
pub fn build_ax_lookup(nodes: &[Value]) -> Result<AxLookup, ProjectionError> {
    let mut lookup = AxLookup::new();
    for node in nodes {
        let backend_id = match node.get("backendDOMNodeId").and_then(|v| v.as_i64()) {
            Some(id) => id,
            None => continue,
        };
        let role = node
            .get("role")
            .and_then(|v| v.get("value"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let name = node
            .get("name")
            .and_then(|v| v.get("value"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let description = node
            .get("description")
            .and_then(|v| v.get("value"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let ignored = node.get("ignored").and_then(|v| v.as_bool()).unwrap_or(false);

        let mut properties = BTreeMap::new();
        if let Some(props) = node.get("properties").and_then(|v| v.as_array()) {
            for prop in props {
                let key = prop.get("name").and_then(|v| v.as_str());
                let value = prop
                    .get("value")
                    .and_then(|v| v.get("value"))
                    .map(|v| value_to_string(v));
                if let (Some(key), Some(value)) = (key, value) {
                    properties.insert(key.to_string(), value);
                }
            }
        }

        lookup.insert(
            backend_id,
            AxFacts {
                role,
                name,
                description,
                properties,
                ignored,
            },
        );
    }
    Ok(lookup)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Fuses a raw `DOM.getDocument` `root` node into an `EnhancedDomNode` tree.
pub fn fuse_tree(
    dom_root: &Value,
    snapshot: &SnapshotLookup,
    ax: &AxLookup,
) -> Result<EnhancedDomNode, ProjectionError> {
    fuse_node(dom_root, snapshot, ax)
}

fn fuse_node(
    node: &Value,
    snapshot: &SnapshotLookup,
    ax: &AxLookup,
) -> Result<EnhancedDomNode, ProjectionError> {
    let backend_node_id = node
        .get("backendNodeId")
        .and_then(|v| v.as_i64())
        .map(BackendNodeId)
        .ok_or_else(|| ProjectionError::MalformedDomTree("node missing backendNodeId".into()))?;

    let node_type_code = node.get("nodeType").and_then(|v| v.as_i64()).unwrap_or(1);
    let node_type = match node_type_code {
        9 => NodeType::Document,
        3 => NodeType::Text,
        11 => NodeType::ShadowRoot,
        _ => NodeType::Element,
    };

    let tag_name = node
        .get("nodeName")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let attributes = parse_attributes(node.get("attributes"));
    let text = node
        .get("nodeValue")
        .and_then(|v| v.as_str())
        .filter(|_| node_type == NodeType::Text)
        .map(|s| s.to_string());

    let children = node
        .get("children")
        .and_then(|v| v.as_array())
        .map(|children| {
            children
                .iter()
                .map(|child| fuse_node(child, snapshot, ax))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();

    let shadow_roots = node
        .get("shadowRoots")
        .and_then(|v| v.as_array())
        .map(|roots| {
            roots
                .iter()
                .map(|root| fuse_node(root, snapshot, ax))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();

    let content_document = node
        .get("contentDocument")
        .map(|doc| fuse_node(doc, snapshot, ax))
        .transpose()?
        .map(Box::new);

    let facts = snapshot.get(&backend_node_id.0).cloned().unwrap_or_default();
    let ax_facts = ax.get(&backend_node_id.0).cloned().unwrap_or_default();

    let frame_id = node
        .get("frameId")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let is_visible = compute_is_visible(&facts.computed_styles, facts.is_clickable);
    let is_scrollable = compute_is_scrollable(&facts, &tag_name);

    Ok(EnhancedDomNode {
        backend_node_id,
        frame_id,
        node_type,
        tag_name,
        attributes,
        text,
        children,
        shadow_roots,
        content_document,
        snapshot: facts.clone(),
        ax: ax_facts,
        is_visible,
        is_scrollable,
        is_clickable: facts.is_clickable,
    })
}

fn parse_attributes(attrs: Option<&Value>) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    if let Some(flat) = attrs.and_then(|v| v.as_array()) {
        let mut iter = flat.iter();
        while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
            if let (Some(key), Some(value)) = (key.as_str(), value.as_str()) {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

fn compute_is_visible(styles: &ComputedStyles, is_clickable: bool) -> bool {
    if is_clickable {
        return true;
    }
    let display_none = styles.display.as_deref() == Some("none");
    let visibility_hidden = matches!(styles.visibility.as_deref(), Some("hidden") | Some("collapse"));
    !display_none && !visibility_hidden
}

/// Common semantic containers treated as scrollable even without explicit
/// `overflow` when their content overflows (§4.1 "Scrollability heuristic").
const IMPLICIT_SCROLL_TAGS: &[&str] = &["div", "main", "body", "html", "section", "article", "aside"];

/// Flattens an `EnhancedDomNode` tree (including shadow roots and iframe
/// content documents) into `{ backend_node_id -> node }` for selector-map
/// lookups in later stages.
pub fn flatten(root: &EnhancedDomNode) -> BTreeMap<i64, EnhancedDomNode> {
    let mut out = BTreeMap::new();
    flatten_into(root, &mut out);
    out
}

fn flatten_into(node: &EnhancedDomNode, out: &mut BTreeMap<i64, EnhancedDomNode>) {
    out.insert(node.backend_node_id.0, node.clone());
    for child in &node.children {
        flatten_into(child, out);
    }
    for shadow in &node.shadow_roots {
        flatten_into(shadow, out);
    }
    if let Some(content) = &node.content_document {
        flatten_into(content, out);
    }
}

fn compute_is_scrollable(facts: &SnapshotFacts, tag_name: &str) -> bool {
    let (client, scroll) = match (facts.client_rect, facts.scroll_rect) {
        (Some(client), Some(scroll)) => (client, scroll),
        _ => return false,
    };
    let overflows = (scroll.width - client.width) > 1.0 || (scroll.height - client.height) > 1.0;
    if !overflows {
        return false;
    }
    if facts.computed_styles.overflow_allows_scroll(true)
        || facts.computed_styles.overflow_allows_scroll(false)
    {
        return true;
    }
    IMPLICIT_SCROLL_TAGS.contains(&tag_name)
}
