//! Stage 5: optimization.
//!
//! Prunes nodes that are not clickable, not visible, not scrollable, not
//! text, and have no surviving children. Runs after paint-order filtering so
//! a node fully occluded and otherwise inert drops out here.

use crate::model::SimplifiedNode;

/// Returns `true` if `node` should be kept by its parent.
pub fn prune(node: &mut SimplifiedNode) -> bool {
    node.children.retain_mut(prune);

    let worth_keeping = node.should_display
        || node.is_scrollable
        || node.is_shadow_host
        || node.tag_name == "iframe"
        || node.text.as_deref().map(|t| !t.trim().is_empty()).unwrap_or(false)
        || !node.children.is_empty();

    worth_keeping && !node.ignored_by_paint_order
}

#[cfg(test)]
mod tests {
    use super::*;
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
            should_display: false,
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
    fn drops_invisible_leaf_with_no_children() {
        let mut leaf = node("div");
        assert!(!prune(&mut leaf));
    }

    #[test]
    fn keeps_occluded_child_only_through_surviving_grandchild() {
        let mut child = node("span");
        child.should_display = true;
        let mut parent = node("div");
        parent.children = vec![child];
        assert!(prune(&mut parent));
        assert_eq!(parent.children.len(), 1);
    }

    #[test]
    fn drops_node_ignored_by_paint_order() {
        let mut occluded = node("div");
        occluded.should_display = true;
        occluded.ignored_by_paint_order = true;
        assert!(!prune(&mut occluded));
    }
}
