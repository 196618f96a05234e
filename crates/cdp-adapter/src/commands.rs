//! Command parameter types exposed by the CDP adapter interface.

use serde::{Deserialize, Serialize};

/// Specification for a DOM query operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuerySpec {
    pub selector: String,
    pub scope: QueryScope,
}

/// Query scope determines which portion of the document the adapter should inspect.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum QueryScope {
    Document,
    Frame(String),
}

/// Target for click or typing operations (L2 resolves concrete data; L0 only injects).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Anchor {
    pub backend_node_id: Option<u64>,
    pub x: f64,
    pub y: f64,
}

/// Wait gate definitions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum WaitGate {
    DomReady,
    NetworkQuiet { window_ms: u64, max_inflight: u32 },
    FrameStable { min_stable_ms: u64 },
}

/// Options for capturing screenshots.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScreenshotOptions {
    pub clip: Option<ScreenshotClip>,
    pub format: ScreenshotFormat,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScreenshotClip {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ScreenshotFormat {
    Png,
    Jpeg { quality: Option<u8> },
}

/// Placeholder for accessor types that will wrap DOM/AX snapshots.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotOptions {
    pub include_dom: bool,
    pub include_ax: bool,
}

/// Parameters for a `select_option` call against a `<select>` element.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectSpec {
    pub selector: String,
    pub value: String,
    pub match_label: bool,
}

/// Options controlling a `DOMSnapshot.captureSnapshot` call.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DomSnapshotConfig {
    pub computed_style_whitelist: Vec<String>,
    pub include_paint_order: bool,
}

/// Flattened result of a `DOMSnapshot.captureSnapshot` call, kept close to
/// the wire shape so callers can walk `raw` directly while cheaper accessors
/// are built on top of `documents`/`strings`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DomSnapshotResult {
    pub documents: Vec<serde_json::Value>,
    pub strings: Vec<String>,
    pub raw: serde_json::Value,
}

/// Options controlling an `Accessibility.getFullAXTree` call.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AxSnapshotConfig {
    pub frame_id: Option<String>,
    pub max_depth: Option<u32>,
    pub fetch_relatives: bool,
}

/// Flattened result of an `Accessibility.getFullAXTree` call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AxSnapshotResult {
    pub nodes: Vec<serde_json::Value>,
    pub tree_id: Option<String>,
    pub raw: serde_json::Value,
}

/// A single `<option>` read off a `<select>` element.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DropdownOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// One open page as reported by `Target.getTargets`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TabInfo {
    pub page: crate::ids::PageId,
    pub url: String,
    pub title: String,
}
