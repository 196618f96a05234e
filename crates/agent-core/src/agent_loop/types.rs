//! Data types exchanged between the message manager and the orchestrator:
//! the LLM's per-step decision, the browser state snapshot it decided over,
//! and the history entry recorded once the step finishes.

use serde::{Deserialize, Serialize};

use action_registry::ActionResult;
use dom_projection::model::{ScrollInfo, SelectorMap, SimplifiedNode};

/// Browser state snapshot handed to the message manager for one step.
///
/// Produced by the `collect_state` substep from `cdp-adapter`'s raw CDP
/// responses run through `dom_projection::pipeline::build`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BrowserStateSummary {
    pub url: String,
    pub title: Option<String>,
    pub tabs: Vec<TabInfo>,
    /// Root of the simplified DOM tree this step's indices were assigned from.
    pub dom_root: SimplifiedNode,
    /// Already-indexed text rendering of `dom_root`, ready to inline in the
    /// prompt's `<browser_state>` block.
    pub llm_text: String,
    pub dom_truncated: bool,
    pub scroll_info: Option<ScrollInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_base64: Option<String>,
    /// Popups the browser layer closed on the agent's behalf this step.
    #[serde(default)]
    pub auto_closed_popups: Vec<String>,
    /// CDP/browser events observed since the previous step (navigation,
    /// download started, dialog opened, ...).
    #[serde(default)]
    pub recent_events: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TabInfo {
    pub page_id: String,
    pub url: String,
    pub title: Option<String>,
    pub is_active: bool,
}

/// The index -> node map the most recent projection produced, retained
/// alongside the summary so the orchestrator can pass it to the registry
/// as `ActionDeps::selector_map` without recomputing anything.
#[derive(Clone, Debug)]
pub struct IndexedBrowserState {
    pub summary: BrowserStateSummary,
    pub selector_map: std::sync::Arc<SelectorMap>,
}

/// One action the model asked to run, by name with loosely-typed params
/// matching whatever `ActionSpec` the registry has for that name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAction {
    pub action: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// The model's full structured response for a single step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDecision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(default)]
    pub evaluation_previous_goal: String,
    #[serde(default)]
    pub memory: String,
    #[serde(default)]
    pub next_goal: String,
    pub action: Vec<AgentAction>,
}

impl StepDecision {
    /// Whether any action in this step is the terminal `done` action.
    pub fn is_done(&self) -> bool {
        self.action.iter().any(|a| a.action == "done")
    }

    /// A single `done` action with no preceding steps, used to force
    /// termination after too many steps or failures.
    pub fn forced_done(success: bool, text: impl Into<String>) -> Self {
        Self {
            thinking: None,
            evaluation_previous_goal: String::new(),
            memory: String::new(),
            next_goal: "Task forcibly concluded".to_string(),
            action: vec![AgentAction {
                action: "done".to_string(),
                params: serde_json::json!({ "success": success, "text": text.into() }),
            }],
        }
    }

    /// A synthetic decision asking the model to retry with a non-empty
    /// action list, used when a call came back with zero actions.
    pub fn empty_action_clarification() -> Self {
        Self {
            thinking: None,
            evaluation_previous_goal: String::new(),
            memory: String::new(),
            next_goal: String::new(),
            action: Vec::new(),
        }
    }
}

/// Outcome of running one `StepDecision`'s actions through the registry.
///
/// Only `Serialize`: `ActionResult` itself is write-only (it's logged and
/// saved to the conversation transcript, never read back as input).
#[derive(Debug, Clone, Serialize)]
pub struct StepExecutionResult {
    pub results: Vec<ActionResult>,
}

impl StepExecutionResult {
    pub fn is_done(&self) -> bool {
        self.results.last().is_some_and(|r| r.is_done)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.results.last().and_then(|r| r.error.as_deref())
    }
}

/// Bookkeeping recorded once a step completes, independent of whether it
/// succeeded; this is what `message_manager` replays into `<agent_history>`.
#[derive(Debug, Clone, Serialize)]
pub struct AgentHistoryEntry {
    pub step_number: u32,
    pub decision: StepDecision,
    pub execution: StepExecutionResult,
    pub metadata: StepMetadata,
}

/// Timing and token-accounting facts about one step, carried for reporting
/// and for the per-step budget checks in the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepMetadata {
    pub step_start_ms: i64,
    pub step_end_ms: i64,
    pub input_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_tokens: Option<u32>,
}

impl StepMetadata {
    pub fn duration_ms(&self) -> i64 {
        (self.step_end_ms - self.step_start_ms).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_decision_is_done_detects_done_action() {
        let decision = StepDecision {
            thinking: None,
            evaluation_previous_goal: "ok".to_string(),
            memory: String::new(),
            next_goal: "finish".to_string(),
            action: vec![AgentAction {
                action: "done".to_string(),
                params: serde_json::json!({ "success": true, "text": "done" }),
            }],
        };
        assert!(decision.is_done());
    }

    #[test]
    fn forced_done_carries_success_flag() {
        let decision = StepDecision::forced_done(false, "ran out of steps");
        assert_eq!(decision.action.len(), 1);
        assert_eq!(decision.action[0].action, "done");
        assert_eq!(decision.action[0].params["success"], false);
    }

    #[test]
    fn step_execution_result_reports_last_error() {
        let result = StepExecutionResult {
            results: vec![ActionResult::ok("first"), ActionResult::err("boom")],
        };
        assert_eq!(result.last_error(), Some("boom"));
        assert!(!result.is_done());
    }
}
