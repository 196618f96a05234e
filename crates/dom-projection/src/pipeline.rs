//! Orchestrates the eight-stage DOM projection pipeline end to end.

use std::time::Instant;

use serde_json::Value;

use crate::errors::ProjectionError;
use crate::model::SerializedDomState;
use crate::{bbox, fuse, interactivity, metrics, optimize, paint_order, serialize, simplify, snapshot};

/// Runs the full pipeline: snapshot lookup → tree fusion → simplification →
/// paint-order filtering → optimization → bbox filtering → interactivity →
/// serialization.
pub fn build(
    dom_root: &Value,
    ax_nodes: &[Value],
    snapshot_raw: &Value,
    snapshot_strings: &[String],
    device_pixel_ratio: f64,
) -> Result<SerializedDomState, ProjectionError> {
    let snapshot_lookup =
        snapshot::build_snapshot_lookup(snapshot_raw, snapshot_strings, device_pixel_ratio)?;
    tracing::debug!(nodes = snapshot_lookup.len(), "built snapshot lookup");
    let ax_lookup = fuse::build_ax_lookup(ax_nodes)?;

    let fuse_start = Instant::now();
    let enhanced_root = fuse::fuse_tree(dom_root, &snapshot_lookup, &ax_lookup)?;
    metrics::record_fuse(fuse_start.elapsed());

    let enhanced_by_id = fuse::flatten(&enhanced_root);

    let simplify_start = Instant::now();
    let mut simplified_root = simplify::simplify(&enhanced_root)
        .ok_or_else(|| ProjectionError::internal("document root was not kept by simplification"))?;
    metrics::record_simplify(simplify_start.elapsed());

    paint_order::apply(&mut simplified_root);
    optimize::prune(&mut simplified_root);
    bbox::apply(&mut simplified_root);
    let selector_map = interactivity::apply(&mut simplified_root, &enhanced_by_id);

    let serialize_start = Instant::now();
    let (llm_text, truncated) = serialize::serialize(&simplified_root);
    metrics::record_serialize(serialize_start.elapsed(), selector_map.len());
    if truncated {
        tracing::warn!(chars = llm_text.len(), "serialized DOM state truncated");
    }

    Ok(SerializedDomState {
        root: simplified_root,
        selector_map,
        llm_text,
        truncated,
    })
}
