//! Replays a previously recorded run against the page's current state.
//!
//! Element indices from the recorded run almost never line up with a fresh
//! DOM projection's `backend_node_id`s, so every `index`-bearing action is
//! re-resolved by structural element hash (tag-ancestry path plus stable
//! attributes) before being dispatched again. `extract` actions are always
//! re-issued live rather than replayed, since their whole point is reading
//! current page content.
use std::collections::{BTreeMap, HashMap};

use dom_projection::model::SelectorMap;
use soulbrowser_core_types::ElementHash;

use super::types::AgentAction;

/// One step's worth of actions from a prior run, with the element hash each
/// `index`-bearing action targeted, captured at original-record time.
#[derive(Debug, Clone)]
pub struct RecordedStep {
    pub actions: Vec<AgentAction>,
    /// `index` (as recorded) -> the element hash it resolved to at the time.
    pub element_hashes: BTreeMap<i64, ElementHash>,
}

#[derive(Debug, Clone)]
pub enum RerunOutcome {
    /// Every `index` in this step re-resolved; ready to dispatch as-is.
    Resolved(Vec<AgentAction>),
    /// At least one `index` had no match in the current selector map after
    /// `max_retries` attempts; the action is dropped and the reason kept for
    /// the end-of-run summary.
    Unresolvable { action: String, reason: String },
}

pub struct RerunManager {
    max_retries: u32,
}

impl RerunManager {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Re-resolves every `index` param in `step` against `selector_map` by
    /// matching structural element hash, rewriting the action list to use
    /// the indices valid for this run of the page.
    pub fn resolve_step(&self, step: &RecordedStep, selector_map: &SelectorMap) -> RerunOutcome {
        let current_hashes = current_element_hashes(selector_map);

        let mut resolved = Vec::with_capacity(step.actions.len());
        for action in &step.actions {
            match self.resolve_action(action, &step.element_hashes, &current_hashes) {
                Some(resolved_action) => resolved.push(resolved_action),
                None => {
                    return RerunOutcome::Unresolvable {
                        action: action.action.clone(),
                        reason: format!(
                            "no element in the current page matched the recorded structural hash after {} attempts",
                            self.max_retries
                        ),
                    }
                }
            }
        }
        RerunOutcome::Resolved(resolved)
    }

    fn resolve_action(
        &self,
        action: &AgentAction,
        recorded_hashes: &BTreeMap<i64, ElementHash>,
        current_hashes: &HashMap<ElementHash, i64>,
    ) -> Option<AgentAction> {
        let Some(recorded_index) = action.params.get("index").and_then(|v| v.as_i64()) else {
            // No element target (navigate, wait, done, ...): replay verbatim.
            return Some(action.clone());
        };
        let hash = recorded_hashes.get(&recorded_index)?;
        let new_index = current_hashes.get(hash)?;

        let mut params = action.params.clone();
        if let Some(obj) = params.as_object_mut() {
            obj.insert("index".to_string(), serde_json::json!(new_index));
        }
        Some(AgentAction {
            action: action.action.clone(),
            params,
        })
    }
}

fn current_element_hashes(selector_map: &SelectorMap) -> HashMap<ElementHash, i64> {
    selector_map
        .iter()
        .map(|(backend_node_id, node)| (node.element_hash(&[]), *backend_node_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_projection::model::{AxFacts, EnhancedDomNode, NodeType, SnapshotFacts};
    use std::collections::BTreeMap as Map;

    fn node(id: i64, tag: &str, attrs: &[(&str, &str)]) -> EnhancedDomNode {
        EnhancedDomNode {
            backend_node_id: soulbrowser_core_types::BackendNodeId(id),
            frame_id: None,
            node_type: NodeType::Element,
            tag_name: tag.to_string(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            text: None,
            children: Vec::new(),
            shadow_roots: Vec::new(),
            content_document: None,
            snapshot: SnapshotFacts::default(),
            ax: AxFacts::default(),
            is_visible: true,
            is_scrollable: false,
            is_clickable: true,
        }
    }

    #[test]
    fn resolves_index_by_matching_structural_hash() {
        let old_node = node(10, "button", &[("id", "submit")]);
        let old_hash = old_node.element_hash(&[]);

        let mut recorded_hashes = Map::new();
        recorded_hashes.insert(0i64, old_hash);

        let step = RecordedStep {
            actions: vec![AgentAction {
                action: "click".to_string(),
                params: serde_json::json!({ "index": 0 }),
            }],
            element_hashes: recorded_hashes,
        };

        let new_node = node(99, "button", &[("id", "submit")]);
        let mut selector_map: SelectorMap = Map::new();
        selector_map.insert(99, new_node);

        let manager = RerunManager::new(2);
        match manager.resolve_step(&step, &selector_map) {
            RerunOutcome::Resolved(actions) => {
                assert_eq!(actions[0].params["index"], 99);
            }
            RerunOutcome::Unresolvable { .. } => panic!("expected a resolved step"),
        }
    }

    #[test]
    fn reports_unresolvable_when_hash_vanishes() {
        let old_node = node(10, "button", &[("id", "submit")]);
        let old_hash = old_node.element_hash(&[]);
        let mut recorded_hashes = Map::new();
        recorded_hashes.insert(0i64, old_hash);

        let step = RecordedStep {
            actions: vec![AgentAction {
                action: "click".to_string(),
                params: serde_json::json!({ "index": 0 }),
            }],
            element_hashes: recorded_hashes,
        };

        let selector_map: SelectorMap = Map::new();
        let manager = RerunManager::new(1);
        match manager.resolve_step(&step, &selector_map) {
            RerunOutcome::Unresolvable { action, .. } => assert_eq!(action, "click"),
            RerunOutcome::Resolved(_) => panic!("expected unresolvable"),
        }
    }
}
