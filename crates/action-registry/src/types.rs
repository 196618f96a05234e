//! Core data types for action dispatch: the execution context every handler
//! receives, and the result every handler returns.

use std::time::{Duration, Instant};

use serde::Serialize;
use soulbrowser_core_types::ExecRoute;
use tokio_util::sync::CancellationToken;

/// Execution context for a single action invocation.
///
/// Contains the runtime context needed to execute an action: the route
/// identifying the target frame, a deadline for timeout enforcement, a
/// cancellation token for cooperative cancellation, and a unique action id
/// for tracing and correlation.
#[derive(Clone)]
pub struct ExecCtx {
    pub route: ExecRoute,
    pub deadline: Instant,
    pub cancel_token: CancellationToken,
    pub action_id: String,
}

impl ExecCtx {
    pub fn new(route: ExecRoute, deadline: Instant, cancel_token: CancellationToken) -> Self {
        Self {
            route,
            deadline,
            cancel_token,
            action_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub fn is_timeout(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn remaining_time(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// How long a handler should let the page settle after a DOM-mutating
/// action before the registry hands control back to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WaitTier {
    /// No settle wait; used by read-only actions (scroll, screenshot).
    None,
    /// Wait for `DOMContentLoaded`; the default for click/input/navigate.
    #[default]
    DomReady,
    /// Wait for DOM ready plus a quiet period on the network, used after
    /// navigations likely to trigger XHR-driven content.
    Idle,
}

/// Outcome of a single dispatched action.
///
/// A handler that fails does not necessarily return `Err` from `dispatch` —
/// most failure modes (stale index, site unavailable, missing dropdown
/// option) are reported as `ActionResult { error: Some(..), .. }` so the
/// agent loop can fold them into the next prompt's history rather than
/// aborting the step. `dispatch` itself only returns `Err` for dispatch-level
/// problems: unknown action name, invalid params, a missing dependency the
/// handler declared as required.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionResult {
    /// Human-readable content surfaced to the LLM on the next turn.
    pub extracted_content: Option<String>,
    /// Set when the action failed in a way the agent should see and react
    /// to, rather than silently retry.
    pub error: Option<String>,
    /// Condensed summary retained across history truncation even after
    /// `extracted_content` ages out. See C4's rolling history.
    pub long_term_memory: Option<String>,
    /// When true, `extracted_content` should appear in the very next prompt
    /// only, then be dropped even though `long_term_memory` survives.
    pub include_extracted_content_only_once: bool,
    /// Structured side-channel data (click coordinates, dropdown options, ...).
    pub metadata: Option<serde_json::Value>,
    /// Set by `done`: the agent loop must stop after this step.
    pub is_done: bool,
    /// Only meaningful when `is_done` is true.
    pub success: Option<bool>,
}

impl ActionResult {
    pub fn ok(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            extracted_content: Some(content.clone()),
            long_term_memory: Some(content),
            ..Default::default()
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_memory(mut self, memory: impl Into<String>) -> Self {
        self.long_term_memory = Some(memory.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn once(mut self) -> Self {
        self.include_extracted_content_only_once = true;
        self
    }

    /// `done(success, text, data)` — terminal action. `success=true` implies
    /// `is_done=true`; the reverse also holds, `done` always ends the run.
    pub fn done(success: bool, text: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            extracted_content: Some(text.into()),
            is_done: true,
            success: Some(success),
            metadata: data,
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
