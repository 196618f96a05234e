//! Stage 1: snapshot lookup construction.
//!
//! Folds a `DOMSnapshot.captureSnapshot` response into
//! `{ backend_node_id -> SnapshotFacts }`, converting device-pixel bounds to
//! CSS-pixel bounds by dividing by the device pixel ratio.

use std::collections::BTreeMap;

use serde_json::Value;
use soulbrowser_core_types::BackendNodeId;

use crate::errors::ProjectionError;
use crate::model::{Bounds, ComputedStyles, SnapshotFacts};

const COMPUTED_STYLE_NAMES: &[&str] = &[
    "display",
    "visibility",
    "opacity",
    "overflow-x",
    "overflow-y",
    "cursor",
    "pointer-events",
    "position",
    "background-color",
];

pub type SnapshotLookup = BTreeMap<i64, SnapshotFacts>;

/// Builds the snapshot lookup from the raw `DOMSnapshot.captureSnapshot` value.
pub fn build_snapshot_lookup(
    raw: &Value,
    strings: &[String],
    device_pixel_ratio: f64,
) -> Result<SnapshotLookup, ProjectionError> {
    let dpr = if device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    };

    let documents = raw
        .get("documents")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ProjectionError::MalformedSnapshot("missing 'documents'".into()))?;

    let mut lookup = SnapshotLookup::new();
    for document in documents {
        merge_document(document, strings, dpr, &mut lookup)?;
    }
    Ok(lookup)
}

fn merge_document(
    document: &Value,
    strings: &[String],
    dpr: f64,
    lookup: &mut SnapshotLookup,
) -> Result<(), ProjectionError> {
    let nodes = match document.get("nodes") {
        Some(nodes) => nodes,
        None => return Ok(()),
    };

    let backend_node_ids = index_array(nodes, "backendNodeId");
    let is_clickable = index_array(nodes, "isClickable")
        .and_then(|v| v.get("index").cloned())
        .unwrap_or_default();

    let layout = document.get("layout");
    let layout_node_index = layout
        .and_then(|l| l.get("nodeIndex"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    let bounds_arr = layout
        .and_then(|l| l.get("bounds"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    let client_rects_arr = layout
        .and_then(|l| l.get("clientRects"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    let scroll_rects_arr = layout
        .and_then(|l| l.get("scrollRects"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    let styles_arr = layout
        .and_then(|l| l.get("styles"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    let paint_orders = layout
        .and_then(|l| l.get("paintOrders"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    let stacking_contexts = layout
        .and_then(|l| l.get("stackingContexts"))
        .and_then(|l| l.get("index"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let backend_node_ids = match backend_node_ids {
        Some(v) => v.as_array().cloned().unwrap_or_default(),
        None => return Ok(()),
    };

    // `layout.nodeIndex[i]` points into the flat node list; find the matching
    // layout row for each node by scanning. Snapshots are small enough (a
    // handful of thousand nodes) that a linear scan per node is acceptable.
    for (layout_row, node_index_value) in layout_node_index.iter().enumerate() {
        let node_index = match node_index_value.as_i64() {
            Some(v) => v as usize,
            None => continue,
        };
        let backend_node_id = match backend_node_ids.get(node_index).and_then(|v| v.as_i64()) {
            Some(v) => v,
            None => continue,
        };

        let bounds = bounds_arr
            .get(layout_row)
            .and_then(|v| v.as_array())
            .and_then(|quad| parse_bounds(quad, dpr));
        let client_rect = client_rects_arr
            .get(layout_row)
            .and_then(|v| v.as_array())
            .and_then(|quad| parse_bounds(quad, dpr))
            .or(bounds);
        let scroll_rect = scroll_rects_arr
            .get(layout_row)
            .and_then(|v| v.as_array())
            .and_then(|quad| parse_bounds(quad, dpr));

        let computed_styles = styles_arr
            .get(layout_row)
            .and_then(|v| v.as_array())
            .map(|indices| parse_computed_styles(indices, strings))
            .unwrap_or_default();

        let paint_order = paint_orders.get(layout_row).and_then(|v| v.as_i64());
        let stacking_context = stacking_contexts.get(layout_row).and_then(|v| v.as_i64());
        let clickable = is_clickable
            .as_array()
            .map(|arr| arr.iter().any(|v| v.as_i64() == Some(node_index as i64)))
            .unwrap_or(false);

        lookup.insert(
            backend_node_id,
            SnapshotFacts {
                is_clickable: clickable,
                bounds,
                client_rect,
                scroll_rect,
                computed_styles,
                paint_order,
                stacking_context,
            },
        );
    }

    Ok(())
}

fn index_array<'a>(nodes: &'a Value, key: &str) -> Option<&'a Value> {
    nodes.get(key)
}

fn parse_bounds(quad: &[Value], dpr: f64) -> Option<Bounds> {
    if quad.len() < 4 {
        return None;
    }
    let x = quad[0].as_f64()?;
    let y = quad[1].as_f64()?;
    let width = quad[2].as_f64()?;
    let height = quad[3].as_f64()?;
    Some(Bounds {
        x: x / dpr,
        y: y / dpr,
        width: width / dpr,
        height: height / dpr,
    })
}

fn parse_computed_styles(indices: &[Value], strings: &[String]) -> ComputedStyles {
    let mut styles = ComputedStyles::default();
    for (i, idx) in indices.iter().enumerate() {
        let name = match COMPUTED_STYLE_NAMES.get(i) {
            Some(n) => *n,
            None => break,
        };
        let value = idx
            .as_i64()
            .and_then(|i| strings.get(i as usize))
            .cloned();
        match name {
            "display" => styles.display = value,
            "visibility" => styles.visibility = value,
            "opacity" => styles.opacity = value.and_then(|v| v.parse().ok()),
            "overflow-x" => styles.overflow_x = value,
            "overflow-y" => styles.overflow_y = value,
            "cursor" => styles.cursor = value,
            "pointer-events" => styles.pointer_events = value,
            "position" => styles.position = value,
            "background-color" => styles.background_color = value,
            _ => {}
        }
    }
    styles
}

pub const COMPUTED_STYLE_WHITELIST: &[&str] = COMPUTED_STYLE_NAMES;
