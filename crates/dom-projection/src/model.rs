//! Core data model shared by every stage of the DOM projection pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use soulbrowser_core_types::{BackendNodeId, ElementHash};

/// Axis-aligned rectangle in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn area(&self) -> f64 {
        (self.width.max(0.0)) * (self.height.max(0.0))
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Area of the intersection of `self` and `other`.
    pub fn intersection_area(&self, other: &Bounds) -> f64 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);
        if x2 <= x1 || y2 <= y1 {
            0.0
        } else {
            (x2 - x1) * (y2 - y1)
        }
    }

    /// Fraction of `self`'s area contained within `other`, in `[0, 1]`.
    pub fn containment_ratio(&self, other: &Bounds) -> f64 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        (self.intersection_area(other) / area).min(1.0)
    }
}

/// The small fixed set of computed styles the pipeline cares about (§3).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ComputedStyles {
    pub display: Option<String>,
    pub visibility: Option<String>,
    pub opacity: Option<f64>,
    pub overflow_x: Option<String>,
    pub overflow_y: Option<String>,
    pub cursor: Option<String>,
    pub pointer_events: Option<String>,
    pub position: Option<String>,
    pub background_color: Option<String>,
}

impl ComputedStyles {
    pub fn is_transparent_background(&self) -> bool {
        matches!(
            self.background_color.as_deref(),
            None | Some("rgba(0, 0, 0, 0)")
        )
    }

    pub fn overflow_allows_scroll(&self, axis_x: bool) -> bool {
        let value = if axis_x {
            self.overflow_x.as_deref()
        } else {
            self.overflow_y.as_deref()
        };
        matches!(value, Some("auto") | Some("scroll") | Some("overlay"))
    }
}

/// Accessibility-tree facts merged onto a node, when present.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AxFacts {
    pub role: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub ignored: bool,
}

impl AxFacts {
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }
}

/// Per-node facts looked up from `DOMSnapshot.captureSnapshot` (stage 1).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SnapshotFacts {
    pub is_clickable: bool,
    pub bounds: Option<Bounds>,
    pub client_rect: Option<Bounds>,
    pub scroll_rect: Option<Bounds>,
    pub computed_styles: ComputedStyles,
    pub paint_order: Option<i64>,
    pub stacking_context: Option<i64>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum NodeType {
    Document,
    Element,
    Text,
    ShadowRoot,
}

/// A unified DOM node: the fusion of the DOM tree, accessibility tree, and
/// `DOMSnapshot` layout facts (§3, stage 2).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnhancedDomNode {
    pub backend_node_id: BackendNodeId,
    pub frame_id: Option<String>,
    pub node_type: NodeType,
    pub tag_name: String,
    pub attributes: BTreeMap<String, String>,
    pub text: Option<String>,
    pub children: Vec<EnhancedDomNode>,
    pub shadow_roots: Vec<EnhancedDomNode>,
    pub content_document: Option<Box<EnhancedDomNode>>,
    pub snapshot: SnapshotFacts,
    pub ax: AxFacts,
    pub is_visible: bool,
    pub is_scrollable: bool,
    pub is_clickable: bool,
}

impl EnhancedDomNode {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|v| v.as_str())
    }

    pub fn tag_path_from(&self, ancestry: &[String]) -> String {
        let mut path = ancestry.to_vec();
        path.push(self.tag_name.clone());
        path.join(">")
    }

    /// Attributes the element-hash considers "static" (§4.5.2).
    pub fn static_attrs(&self) -> Vec<(String, String)> {
        const STATIC_KEYS: &[&str] = &[
            "id",
            "class",
            "name",
            "type",
            "placeholder",
            "aria-label",
            "href",
            "data-testid",
            "role",
        ];
        STATIC_KEYS
            .iter()
            .filter_map(|key| self.attributes.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect()
    }

    pub fn element_hash(&self, ancestry: &[String]) -> ElementHash {
        ElementHash::compute(&self.tag_path_from(ancestry), &self.static_attrs())
    }
}

/// A synthesized descriptor for a compound control's virtual children
/// (stage 3, e.g. select options or a range slider).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VirtualChild {
    pub label: String,
    pub value: Option<String>,
}

/// One-to-one simplified projection of a subset of `EnhancedDomNode` (§3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimplifiedNode {
    pub backend_node_id: BackendNodeId,
    pub tag_name: String,
    pub attributes: BTreeMap<String, String>,
    pub text: Option<String>,
    pub children: Vec<SimplifiedNode>,
    pub virtual_children: Vec<VirtualChild>,
    pub bounds: Option<Bounds>,
    pub should_display: bool,
    pub is_interactive: bool,
    pub is_scrollable: bool,
    pub excluded_by_parent: bool,
    pub ignored_by_paint_order: bool,
    pub is_shadow_host: bool,
    pub is_compound_component: bool,
    pub scroll_info: Option<ScrollInfo>,
    pub format_hint: Option<String>,
    pub paint_order: Option<i64>,
    pub opacity: Option<f64>,
    pub transparent_background: bool,
    pub is_real_button: bool,
    pub is_clickable: bool,
    pub cursor: Option<String>,
    pub ax_role: Option<String>,
    pub ax_properties: BTreeMap<String, String>,
    pub ax_ignored: bool,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ScrollInfo {
    pub pages_above: f64,
    pub pages_below: f64,
    pub pct: f64,
}

/// Mapping from `backend_node_id` to the enhanced node the serializer marked
/// interactive. Stable within a single `BrowserStateSummary`.
pub type SelectorMap = BTreeMap<i64, EnhancedDomNode>;

/// Final output of the DOM projection pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SerializedDomState {
    pub root: SimplifiedNode,
    pub selector_map: SelectorMap,
    pub llm_text: String,
    pub truncated: bool,
}
