//! The agent's step loop: collect state, ask the model what to do, run it,
//! record what happened, repeat until `done` or a budget runs out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use action_registry::{ActionDeps, ActionRegistry, ActionResult, ExecCtx};
use cdp_adapter::CdpAdapter;
use soulbrowser_core_types::{ChatMessage, ChatModel, ExecRoute};

use crate::errors::AgentError;
use crate::file_system::LocalFileSystem;
use crate::model::AgentRequest;

use super::config::AgentLoopConfig;
use super::message_manager::{MessageManager, StepInfo};
use super::state_collector;
use super::types::{
    AgentAction, AgentHistoryEntry, StepDecision, StepExecutionResult, StepMetadata,
};

/// Actions that can invalidate previously-indexed elements, used to decide
/// whether to pause briefly before dispatching the next action in a step.
const DOM_MUTATING_ACTIONS: &[&str] = &["click", "input", "navigate", "select", "send_keys"];

pub struct AgentOrchestrator {
    config: AgentLoopConfig,
    registry: Arc<ActionRegistry>,
    cdp: Arc<CdpAdapter>,
    llm: Arc<dyn ChatModel>,
    fallback_llm: Option<Arc<dyn ChatModel>>,
    messages: MessageManager,
    file_system: Arc<LocalFileSystem>,
    cancel_token: CancellationToken,
}

/// What the run produced, independent of whether it reached `done` cleanly.
pub struct RunOutcome {
    pub success: bool,
    pub final_text: String,
    pub history: Vec<AgentHistoryEntry>,
    pub steps_taken: u32,
}

impl AgentOrchestrator {
    pub fn new(
        config: AgentLoopConfig,
        registry: Arc<ActionRegistry>,
        cdp: Arc<CdpAdapter>,
        llm: Arc<dyn ChatModel>,
        file_system: Arc<LocalFileSystem>,
    ) -> Self {
        let messages = MessageManager::new(config.clone());
        Self {
            config,
            registry,
            cdp,
            llm,
            fallback_llm: None,
            messages,
            file_system,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn with_fallback_llm(mut self, fallback: Arc<dyn ChatModel>) -> Self {
        self.fallback_llm = Some(fallback);
        self
    }

    /// Signals a cooperative stop; the current step finishes, the next one
    /// never starts.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    pub async fn run(
        &mut self,
        request: &AgentRequest,
        route: ExecRoute,
    ) -> Result<RunOutcome, AgentError> {
        let resolved = self
            .cdp
            .resolve_execution_context(&route)
            .await
            .map_err(|e| AgentError::BrowserNotReady(e.to_string()))?;
        let page = resolved.page;

        let mut history: Vec<AgentHistoryEntry> = Vec::new();
        let mut consecutive_failures: u32 = 0;
        let mut n_steps: u32 = 0;

        for initial in &request.initial_actions {
            let deps = self.build_deps(None, None);
            let ctx = self.exec_ctx(&route);
            let result = self
                .registry
                .dispatch(&initial.action, initial.params.clone(), ctx, deps)
                .await;
            if let Err(e) = result {
                tracing::warn!(action = %initial.action, error = %e, "initial action failed");
            }
        }

        loop {
            if self.cancel_token.is_cancelled() {
                break;
            }
            n_steps += 1;
            let step_start = Instant::now();

            let forced = self.check_forced_completion(n_steps, consecutive_failures);

            let step_result = self
                .run_one_step(request, &route, page, &history, forced)
                .await;

            let (decision, execution) = match step_result {
                Ok(pair) => {
                    consecutive_failures = 0;
                    pair
                }
                Err(err) => {
                    consecutive_failures += 1;
                    tracing::warn!(step = n_steps, error = %err, "step failed");
                    let decision = StepDecision {
                        thinking: None,
                        evaluation_previous_goal: String::new(),
                        memory: String::new(),
                        next_goal: String::new(),
                        action: Vec::new(),
                    };
                    let execution = StepExecutionResult {
                        results: vec![ActionResult::err(err.to_string())],
                    };
                    (decision, execution)
                }
            };

            let is_done = execution.is_done();

            history.push(AgentHistoryEntry {
                step_number: n_steps,
                decision: decision.clone(),
                execution,
                metadata: StepMetadata {
                    step_start_ms: 0,
                    step_end_ms: step_start.elapsed().as_millis() as i64,
                    input_tokens: 0,
                    cached_tokens: None,
                },
            });

            if is_done {
                let (success, text) = done_result(&decision);
                return Ok(RunOutcome {
                    success,
                    final_text: text,
                    history,
                    steps_taken: n_steps,
                });
            }

            if n_steps >= self.config.max_steps
                || consecutive_failures > self.config.max_consecutive_failures
            {
                break;
            }
        }

        Ok(RunOutcome {
            success: false,
            final_text: "Run ended without completing the task.".to_string(),
            history,
            steps_taken: n_steps,
        })
    }

    fn check_forced_completion(&self, n_steps: u32, consecutive_failures: u32) -> Option<&'static str> {
        if n_steps >= self.config.max_steps {
            Some("Out of steps; call done now with whatever progress was made.")
        } else if self.config.final_response_after_failure
            && consecutive_failures > self.config.max_consecutive_failures
        {
            Some("Too many consecutive failures; call done now and explain what went wrong.")
        } else {
            None
        }
    }

    async fn run_one_step(
        &mut self,
        request: &AgentRequest,
        route: &ExecRoute,
        page: cdp_adapter::PageId,
        history: &[AgentHistoryEntry],
        forced: Option<&'static str>,
    ) -> Result<(StepDecision, StepExecutionResult), AgentError> {
        let indexed_state = state_collector::collect_state(
            &self.cdp,
            page,
            self.config.enable_vision,
            1.0,
        )
        .await?;

        let sensitive_keys = Vec::new();
        let (messages, shortener) = self.messages.compose(
            &request.goal,
            history,
            &indexed_state.summary,
            &self.file_system.describe(),
            &self.file_system.get_todo_contents(),
            &sensitive_keys,
            StepInfo {
                step_number: history.len() as u32 + 1,
                max_steps: self.config.max_steps,
            },
            None,
            None,
            forced,
        );

        let decision = self.call_llm(messages).await?;

        let mut decision_value = serde_json::to_value(&decision)
            .map_err(|e| AgentError::LlmOutput(e.to_string()))?;
        self.messages.restore_urls(&shortener, &mut decision_value);
        let decision: StepDecision = serde_json::from_value(decision_value)
            .map_err(|e| AgentError::LlmOutput(e.to_string()))?;

        let deps = self.build_deps(
            Some(indexed_state.summary.url.as_str()),
            Some(Arc::clone(&indexed_state.selector_map)),
        );
        let execution = self.multi_act(&decision.action, route, deps).await;

        Ok((decision, execution))
    }

    async fn call_llm(&self, messages: Vec<ChatMessage>) -> Result<StepDecision, AgentError> {
        let decision = self.try_call_llm(messages.clone()).await;
        let decision = match decision {
            Ok(decision) if !decision.action.is_empty() => decision,
            Ok(_) => {
                let mut retry_messages = messages.clone();
                retry_messages.push(ChatMessage::user(
                    "Your last response had no actions. Respond again with at least one action."
                        .to_string(),
                ));
                match self.try_call_llm(retry_messages).await {
                    Ok(decision) if !decision.action.is_empty() => decision,
                    _ => StepDecision {
                        thinking: None,
                        evaluation_previous_goal: String::new(),
                        memory: String::new(),
                        next_goal: "Retrying with a no-op while re-assessing".to_string(),
                        action: vec![AgentAction {
                            action: "wait".to_string(),
                            params: serde_json::json!({ "seconds": 1 }),
                        }],
                    },
                }
            }
            Err(err) => {
                if let Some(fallback) = &self.fallback_llm {
                    tracing::warn!(error = %err, "primary LLM call failed, trying fallback");
                    self.call_llm_with(fallback.as_ref(), messages).await?
                } else {
                    return Err(err);
                }
            }
        };
        Ok(decision)
    }

    async fn try_call_llm(&self, messages: Vec<ChatMessage>) -> Result<StepDecision, AgentError> {
        self.call_llm_with(self.llm.as_ref(), messages).await
    }

    async fn call_llm_with(
        &self,
        llm: &dyn ChatModel,
        messages: Vec<ChatMessage>,
    ) -> Result<StepDecision, AgentError> {
        let timeout = Duration::from_millis(self.config.llm_timeout_ms);
        let completion = tokio::time::timeout(timeout, llm.invoke(messages))
            .await
            .map_err(|_| AgentError::LlmCall("timed out".to_string()))?
            .map_err(|e| AgentError::LlmCall(e.to_string()))?;

        parse_step_decision(&completion.completion)
    }

    async fn multi_act(
        &self,
        actions: &[AgentAction],
        route: &ExecRoute,
        deps: ActionDeps,
    ) -> StepExecutionResult {
        let mut results = Vec::with_capacity(actions.len());
        for (i, action) in actions.iter().enumerate() {
            let ctx = self.exec_ctx(route);
            let result = self
                .registry
                .dispatch(&action.action, action.params.clone(), ctx, deps.clone())
                .await;

            let result = match result {
                Ok(result) => result,
                Err(err) => ActionResult::err(err.to_string()),
            };

            let is_done = result.is_done;
            results.push(result);

            if is_done {
                break;
            }

            let next_is_last = i + 1 == actions.len();
            if !next_is_last && DOM_MUTATING_ACTIONS.contains(&action.action.as_str()) {
                tokio::time::sleep(Duration::from_millis(
                    self.config_wait_between_actions_ms(),
                ))
                .await;
            }
        }
        StepExecutionResult { results }
    }

    fn config_wait_between_actions_ms(&self) -> u64 {
        self.config.wait_between_actions_ms
    }

    fn build_deps(
        &self,
        current_url: Option<&str>,
        selector_map: Option<Arc<dom_projection::model::SelectorMap>>,
    ) -> ActionDeps {
        let mut deps = ActionDeps::new(Arc::clone(&self.cdp))
            .with_extraction_llm(Arc::clone(&self.llm) as Arc<dyn ChatModel>)
            .with_file_system(Arc::clone(&self.file_system) as Arc<dyn action_registry::ActionFileSystem>);
        if let Some(url) = current_url {
            deps = deps.with_page_url(url);
        }
        if let Some(map) = selector_map {
            deps = deps.with_selector_map(map);
        }
        deps
    }

    fn exec_ctx(&self, route: &ExecRoute) -> ExecCtx {
        ExecCtx::new(
            route.clone(),
            Instant::now() + Duration::from_millis(self.config.action_timeout_ms),
            self.cancel_token.clone(),
        )
    }
}

fn done_result(decision: &StepDecision) -> (bool, String) {
    for action in &decision.action {
        if action.action == "done" {
            let success = action
                .params
                .get("success")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            let text = action
                .params
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            return (success, text);
        }
    }
    (false, String::new())
}

/// Parses the model's completion text as a `StepDecision`, tolerating a
/// response wrapped in a markdown code fence.
fn parse_step_decision(completion: &str) -> Result<StepDecision, AgentError> {
    let trimmed = completion.trim();
    let json_text = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|s| s.trim_end_matches("```").trim())
        .unwrap_or(trimmed);

    serde_json::from_str(json_text).map_err(|e| AgentError::LlmOutput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_decision() {
        let text = r#"{"evaluation_previous_goal":"ok","memory":"","next_goal":"continue","action":[{"action":"wait","params":{"seconds":1}}]}"#;
        let decision = parse_step_decision(text).unwrap();
        assert_eq!(decision.action.len(), 1);
        assert_eq!(decision.action[0].action, "wait");
    }

    #[test]
    fn parses_fenced_json_decision() {
        let text = "```json\n{\"evaluation_previous_goal\":\"\",\"memory\":\"\",\"next_goal\":\"\",\"action\":[]}\n```";
        let decision = parse_step_decision(text).unwrap();
        assert!(decision.action.is_empty());
    }

    #[test]
    fn done_result_reads_success_and_text() {
        let decision = StepDecision {
            thinking: None,
            evaluation_previous_goal: String::new(),
            memory: String::new(),
            next_goal: String::new(),
            action: vec![AgentAction {
                action: "done".to_string(),
                params: serde_json::json!({"success": true, "text": "booked the flight"}),
            }],
        };
        let (success, text) = done_result(&decision);
        assert!(success);
        assert_eq!(text, "booked the flight");
    }
}
