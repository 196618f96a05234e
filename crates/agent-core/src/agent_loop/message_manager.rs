//! Builds the rolling prompt the orchestrator sends to the model each step.
//!
//! The layout is always: one cached system message, one state message
//! carrying `<agent_history>`/`<agent_state>`/`<browser_state>` (and
//! optionally `<read_state>`/`<page_specific_actions>`), and zero or more
//! per-step context messages that don't survive into the next step.

use action_registry::SensitiveDataMap;
use soulbrowser_core_types::ChatMessage;

use super::config::AgentLoopConfig;
use super::types::{AgentHistoryEntry, BrowserStateSummary};
use super::url_shortener::UrlShortener;

/// Position within the run, rendered into `<step_info>`.
#[derive(Clone, Copy, Debug)]
pub struct StepInfo {
    pub step_number: u32,
    pub max_steps: u32,
}

pub struct MessageManager {
    config: AgentLoopConfig,
    system_message: ChatMessage,
}

impl MessageManager {
    pub fn new(config: AgentLoopConfig) -> Self {
        let system_message = build_system_message(&config);
        Self {
            config,
            system_message,
        }
    }

    /// Assembles the full message list for one step. `read_state` is the
    /// content of any `read_file`/`extract` result flagged
    /// `include_extracted_content_only_once`, shown once then dropped.
    #[allow(clippy::too_many_arguments)]
    pub fn compose(
        &self,
        task: &str,
        history: &[AgentHistoryEntry],
        state: &BrowserStateSummary,
        fs_description: &str,
        todo_contents: &str,
        sensitive_keys: &[String],
        step_info: StepInfo,
        read_state: Option<&str>,
        page_specific_actions: Option<&str>,
        forced_completion: Option<&str>,
    ) -> (Vec<ChatMessage>, UrlShortener) {
        let mut shortener = UrlShortener::new(self.config.url_shorten_threshold);

        let mut body = String::new();
        body.push_str(&render_history(history, self.config.max_history_items));
        body.push_str(&render_agent_state(
            task,
            fs_description,
            todo_contents,
            sensitive_keys,
            step_info,
        ));
        body.push_str(&render_browser_state(state, &mut shortener));

        if let Some(read_state) = read_state {
            body.push_str("<read_state>\n");
            body.push_str(read_state);
            body.push_str("\n</read_state>\n");
        }
        if let Some(actions) = page_specific_actions {
            body.push_str("<page_specific_actions>\n");
            body.push_str(actions);
            body.push_str("\n</page_specific_actions>\n");
        }
        if let Some(notice) = forced_completion {
            body.push_str(&format!("<last_step>{notice}</last_step>\n"));
        }

        let mut messages = vec![self.system_message.clone(), ChatMessage::user(body)];

        if self.config.enable_vision {
            if let Some(screenshot) = &state.screenshot_base64 {
                messages.push(ChatMessage::user(format!(
                    "Current screenshot (base64, omitted from transcript; {} bytes).",
                    screenshot.len()
                )));
            }
        }

        (messages, shortener)
    }

    /// Restores any URL the model echoed back in shortened form, mutating
    /// the parsed structured output in place.
    pub fn restore_urls(&self, shortener: &UrlShortener, value: &mut serde_json::Value) {
        shortener.restore_in(value);
    }
}

fn build_system_message(config: &AgentLoopConfig) -> ChatMessage {
    let thinking_clause = if config.use_extended_thinking {
        "Start your response with a `thinking` field laying out your reasoning before committing to actions."
    } else {
        "Omit the `thinking` field; reason silently and commit directly to `evaluation_previous_goal`/`memory`/`next_goal`/`action`."
    };
    let vision_clause = if config.enable_vision {
        "A screenshot of the current page may follow the state message; use it alongside the element tree."
    } else {
        "No screenshots are provided; rely entirely on the indexed element tree."
    };
    ChatMessage::system(format!(
        "You control a web browser through a fixed set of indexed actions. \
Respond with a JSON object matching the step decision schema: \
`evaluation_previous_goal`, `memory`, `next_goal`, and `action` (a list of at most {} actions). \
{thinking_clause} {vision_clause} \
Element indices in `<browser_state>` are stable for this step only; after any action that changes the \
page, treat indices from before that action as potentially stale.",
        config.max_actions_per_step
    ))
}

fn render_history(history: &[AgentHistoryEntry], max_items: u32) -> String {
    let mut out = String::from("<agent_history>\n");
    let max_items = max_items.max(1) as usize;
    if history.len() <= max_items {
        for entry in history {
            out.push_str(&render_history_item(entry));
        }
    } else {
        out.push_str(&render_history_item(&history[0]));
        let kept_from = history.len() - (max_items - 1);
        let omitted = kept_from - 1;
        out.push_str(&format!("<sys>[… {omitted} previous steps omitted …]</sys>\n"));
        for entry in &history[kept_from..] {
            out.push_str(&render_history_item(entry));
        }
    }
    out.push_str("</agent_history>\n");
    out
}

fn render_history_item(entry: &AgentHistoryEntry) -> String {
    let actions: Vec<String> = entry
        .decision
        .action
        .iter()
        .map(|a| a.action.clone())
        .collect();
    format!(
        "Step {}: evaluation=\"{}\" memory=\"{}\" next_goal=\"{}\" actions=[{}] error={}\n",
        entry.step_number,
        entry.decision.evaluation_previous_goal,
        entry.decision.memory,
        entry.decision.next_goal,
        actions.join(", "),
        entry
            .execution
            .last_error()
            .map(|e| format!("\"{e}\""))
            .unwrap_or_else(|| "none".to_string()),
    )
}

fn render_agent_state(
    task: &str,
    fs_description: &str,
    todo_contents: &str,
    sensitive_keys: &[String],
    step_info: StepInfo,
) -> String {
    let mut out = String::from("<agent_state>\n");
    out.push_str(&format!("<task>{task}</task>\n"));
    out.push_str(&format!("<file_system>{fs_description}</file_system>\n"));
    out.push_str(&format!("<todo>{todo_contents}</todo>\n"));
    if !sensitive_keys.is_empty() {
        out.push_str(&format!(
            "<sensitive_data_description>Placeholders usable on this page: {}</sensitive_data_description>\n",
            sensitive_keys.join(", ")
        ));
    }
    out.push_str(&format!(
        "<step_info>step {} of {}</step_info>\n",
        step_info.step_number, step_info.max_steps
    ));
    out.push_str(&format!("<date>{}</date>\n", chrono::Utc::now().to_rfc3339()));
    out.push_str("</agent_state>\n");
    out
}

fn render_browser_state(state: &BrowserStateSummary, shortener: &mut UrlShortener) -> String {
    let mut out = String::from("<browser_state>\n");
    out.push_str(&format!("<url>{}</url>\n", shortener.shorten(&state.url)));
    if let Some(title) = &state.title {
        out.push_str(&format!("<title>{title}</title>\n"));
    }
    out.push_str("<tabs>\n");
    for tab in &state.tabs {
        out.push_str(&format!(
            "- {}{} {}\n",
            if tab.is_active { "*" } else { " " },
            shortener.shorten(&tab.url),
            tab.title.as_deref().unwrap_or("")
        ));
    }
    out.push_str("</tabs>\n");
    if let Some(scroll) = state.scroll_info {
        out.push_str(&format!(
            "<scroll pages_above=\"{:.1}\" pages_below=\"{:.1}\" pct=\"{:.0}\"/>\n",
            scroll.pages_above, scroll.pages_below, scroll.pct
        ));
    }
    if !state.recent_events.is_empty() {
        out.push_str("<recent_events>\n");
        for event in &state.recent_events {
            out.push_str(&format!("- {event}\n"));
        }
        out.push_str("</recent_events>\n");
    }
    if !state.auto_closed_popups.is_empty() {
        out.push_str(&format!(
            "<auto_closed_popups>{}</auto_closed_popups>\n",
            state.auto_closed_popups.join(", ")
        ));
    }
    out.push_str(&state.llm_text);
    if state.dom_truncated {
        out.push_str("\n<sys>[DOM tree truncated]</sys>\n");
    }
    out.push_str("\n</browser_state>\n");
    out
}

/// Replaces every occurrence of a known sensitive value with its
/// `<secret>key</secret>` placeholder before a conversation is persisted.
pub fn redact_for_storage(text: &str, sensitive_data: &SensitiveDataMap) -> String {
    let mut redacted = text.to_string();
    for (key, value) in sensitive_data.all_entries() {
        if value.is_empty() {
            continue;
        }
        redacted = redacted.replace(&value, &format!("<secret>{key}</secret>"));
    }
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_loop::types::{AgentAction, StepDecision, StepExecutionResult};
    use action_registry::ActionResult;
    use dom_projection::model::{Bounds, SimplifiedNode};
    use std::collections::BTreeMap;

    fn dummy_node() -> SimplifiedNode {
        SimplifiedNode {
            backend_node_id: soulbrowser_core_types::BackendNodeId(1),
            tag_name: "body".to_string(),
            attributes: BTreeMap::new(),
            text: None,
            children: Vec::new(),
            virtual_children: Vec::new(),
            bounds: Some(Bounds::default()),
            should_display: true,
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
            ax_properties: BTreeMap::new(),
            ax_ignored: false,
        }
    }

    fn dummy_state(url: &str) -> BrowserStateSummary {
        BrowserStateSummary {
            url: url.to_string(),
            title: Some("Example".to_string()),
            tabs: Vec::new(),
            dom_root: dummy_node(),
            llm_text: "[1]<button>Go</button>".to_string(),
            dom_truncated: false,
            scroll_info: None,
            screenshot_base64: None,
            auto_closed_popups: Vec::new(),
            recent_events: Vec::new(),
        }
    }

    #[test]
    fn compose_includes_task_and_browser_state() {
        let manager = MessageManager::new(AgentLoopConfig::minimal());
        let (messages, _) = manager.compose(
            "book a flight",
            &[],
            &dummy_state("https://example.com"),
            "File system is empty.",
            "",
            &[],
            StepInfo {
                step_number: 1,
                max_steps: 10,
            },
            None,
            None,
            None,
        );
        assert_eq!(messages.len(), 2);
        assert!(messages[1].content.contains("book a flight"));
        assert!(messages[1].content.contains("[1]<button>Go</button>"));
    }

    #[test]
    fn history_truncation_keeps_first_and_recent() {
        let history: Vec<AgentHistoryEntry> = (1..=8)
            .map(|n| AgentHistoryEntry {
                step_number: n,
                decision: StepDecision {
                    thinking: None,
                    evaluation_previous_goal: "ok".to_string(),
                    memory: String::new(),
                    next_goal: "continue".to_string(),
                    action: vec![AgentAction {
                        action: "click".to_string(),
                        params: serde_json::json!({"index": 1}),
                    }],
                },
                execution: StepExecutionResult {
                    results: vec![ActionResult::ok("done")],
                },
                metadata: Default::default(),
            })
            .collect();

        let rendered = render_history(&history, 3);
        assert!(rendered.contains("Step 1:"));
        assert!(rendered.contains("omitted"));
        assert!(rendered.contains("Step 7:"));
        assert!(rendered.contains("Step 8:"));
        assert!(!rendered.contains("Step 2:"));
    }

    #[test]
    fn redaction_replaces_known_secret_values() {
        let mut secrets = SensitiveDataMap::new();
        secrets.insert_global("password", "hunter2");
        let text = "typed hunter2 into the password field";
        let redacted = redact_for_storage(text, &secrets);
        assert_eq!(redacted, "typed <secret>password</secret> into the password field");
    }
}
