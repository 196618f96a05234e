//! Stage 4: paint-order occlusion filtering (§4.1 step 4, exact constants §11.2).
//!
//! Nodes are grouped by paint order, descending. A disjoint-rectangle union
//! is maintained by recursive subtraction (`split_diff`); a node whose bounds
//! are fully contained in the union accumulated so far is marked
//! `ignored_by_paint_order`, unless it is a real button/link-as-button.

use crate::model::{Bounds, SimplifiedNode};

const MIN_OPACITY_FOR_UNION: f64 = 0.8;

struct Entry {
    bounds: Option<Bounds>,
    paint_order: i64,
    opacity: Option<f64>,
    transparent_background: bool,
    is_real_button: bool,
}

/// Applies occlusion filtering in place, walking the whole tree.
pub fn apply(root: &mut SimplifiedNode) {
    let mut entries = Vec::new();
    collect(root, &mut entries);

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| entries[b].paint_order.cmp(&entries[a].paint_order));

    let mut union = RectUnion::new();
    let mut marks = vec![false; entries.len()];

    let mut i = 0;
    while i < order.len() {
        let current_order = entries[order[i]].paint_order;
        let mut group_end = i;
        while group_end < order.len() && entries[order[group_end]].paint_order == current_order {
            group_end += 1;
        }

        for &idx in &order[i..group_end] {
            if let Some(bounds) = entries[idx].bounds {
                if union.contains(&bounds) {
                    marks[idx] = true;
                }
            }
        }
        for &idx in &order[i..group_end] {
            let entry = &entries[idx];
            if eligible_for_union(entry) {
                if let Some(bounds) = entry.bounds {
                    union.add(bounds);
                }
            }
        }

        i = group_end;
    }

    let mut cursor = 0;
    apply_marks(root, &marks, &mut cursor);
}

fn eligible_for_union(entry: &Entry) -> bool {
    let opacity_ok = entry.opacity.map(|o| o >= MIN_OPACITY_FOR_UNION).unwrap_or(true);
    opacity_ok && !entry.transparent_background
}

fn collect(node: &SimplifiedNode, out: &mut Vec<Entry>) {
    out.push(Entry {
        bounds: node.bounds,
        paint_order: node.paint_order.unwrap_or(0),
        opacity: node.opacity,
        transparent_background: node.transparent_background,
        is_real_button: node.is_real_button,
    });
    for child in &node.children {
        collect(child, out);
    }
}

fn apply_marks(node: &mut SimplifiedNode, marks: &[bool], cursor: &mut usize) {
    let idx = *cursor;
    *cursor += 1;
    if marks.get(idx).copied().unwrap_or(false) && !node.is_real_button {
        node.ignored_by_paint_order = true;
    }
    for child in &mut node.children {
        apply_marks(child, marks, cursor);
    }
}

/// Disjoint-rectangle union via recursive subtraction.
struct RectUnion {
    rects: Vec<Bounds>,
}

impl RectUnion {
    fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Stack-based full-coverage check: `bounds` is contained iff subtracting
    /// every unioned rectangle from it leaves nothing.
    fn contains(&self, bounds: &Bounds) -> bool {
        if bounds.is_empty() {
            return false;
        }
        let mut remaining = vec![*bounds];
        for rect in &self.rects {
            let mut next_remaining = Vec::new();
            for piece in remaining {
                next_remaining.extend(split_diff(&piece, rect));
            }
            remaining = next_remaining;
            if remaining.is_empty() {
                return true;
            }
        }
        remaining.is_empty()
    }

    fn add(&mut self, bounds: Bounds) {
        if !bounds.is_empty() {
            self.rects.push(bounds);
        }
    }
}

/// Subtracts `cover` from `rect`, returning at most four remaining pieces
/// (top, bottom, left, right slices of the non-overlapping part).
fn split_diff(rect: &Bounds, cover: &Bounds) -> Vec<Bounds> {
    let ix1 = rect.x.max(cover.x);
    let iy1 = rect.y.max(cover.y);
    let ix2 = (rect.x + rect.width).min(cover.x + cover.width);
    let iy2 = (rect.y + rect.height).min(cover.y + cover.height);

    if ix2 <= ix1 || iy2 <= iy1 {
        return vec![*rect];
    }

    let mut pieces = Vec::new();
    let rx2 = rect.x + rect.width;
    let ry2 = rect.y + rect.height;

    if rect.y < iy1 {
        pieces.push(Bounds {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: iy1 - rect.y,
        });
    }
    if ry2 > iy2 {
        pieces.push(Bounds {
            x: rect.x,
            y: iy2,
            width: rect.width,
            height: ry2 - iy2,
        });
    }
    if rect.x < ix1 {
        pieces.push(Bounds {
            x: rect.x,
            y: iy1,
            width: ix1 - rect.x,
            height: iy2 - iy1,
        });
    }
    if rx2 > ix2 {
        pieces.push(Bounds {
            x: ix2,
            y: iy1,
            width: rx2 - ix2,
            height: iy2 - iy1,
        });
    }

    pieces.retain(|p| !p.is_empty());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(bounds: Bounds, paint_order: i64) -> SimplifiedNode {
        SimplifiedNode {
            backend_node_id: soulbrowser_core_types::BackendNodeId(1),
            tag_name: "div".to_string(),
            attributes: Default::default(),
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
            paint_order: Some(paint_order),
            opacity: Some(1.0),
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
    fn occludes_fully_covered_lower_paint_order_node() {
        let top = leaf(Bounds { x: 0.0, y: 0.0, width: 100.0, height: 100.0 }, 2);
        let bottom = leaf(Bounds { x: 10.0, y: 10.0, width: 20.0, height: 20.0 }, 1);
        let mut root = leaf(Bounds { x: 0.0, y: 0.0, width: 200.0, height: 200.0 }, 3);
        root.children = vec![top, bottom];

        apply(&mut root);

        assert!(!root.children[0].ignored_by_paint_order);
        assert!(root.children[1].ignored_by_paint_order);
    }

    #[test]
    fn real_button_is_never_occluded() {
        let mut top = leaf(Bounds { x: 0.0, y: 0.0, width: 100.0, height: 100.0 }, 2);
        top.is_real_button = false;
        let mut button = leaf(Bounds { x: 10.0, y: 10.0, width: 20.0, height: 20.0 }, 1);
        button.is_real_button = true;
        let mut root = leaf(Bounds { x: 0.0, y: 0.0, width: 200.0, height: 200.0 }, 3);
        root.children = vec![top, button];

        apply(&mut root);

        assert!(!root.children[1].ignored_by_paint_order);
    }

    #[test]
    fn low_opacity_node_does_not_join_union() {
        let mut top = leaf(Bounds { x: 0.0, y: 0.0, width: 100.0, height: 100.0 }, 2);
        top.opacity = Some(0.3);
        let bottom = leaf(Bounds { x: 10.0, y: 10.0, width: 20.0, height: 20.0 }, 1);
        let mut root = leaf(Bounds { x: 0.0, y: 0.0, width: 200.0, height: 200.0 }, 3);
        root.children = vec![top, bottom];

        apply(&mut root);

        assert!(!root.children[1].ignored_by_paint_order);
    }

    #[test]
    fn transparent_background_node_does_not_join_union() {
        let mut top = leaf(Bounds { x: 0.0, y: 0.0, width: 100.0, height: 100.0 }, 2);
        top.transparent_background = true;
        let bottom = leaf(Bounds { x: 10.0, y: 10.0, width: 20.0, height: 20.0 }, 1);
        let mut root = leaf(Bounds { x: 0.0, y: 0.0, width: 200.0, height: 200.0 }, 3);
        root.children = vec![top, bottom];

        apply(&mut root);

        assert!(!root.children[1].ignored_by_paint_order);
    }
}
