use thiserror::Error;

/// Errors emitted by the agent-core crate.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Raised when an agent request is malformed or missing required fields.
    #[error("invalid agent request: {0}")]
    InvalidRequest(String),

    /// The LLM call for a step failed (provider error, rate limit, timeout).
    #[error("LLM call failed: {0}")]
    LlmCall(String),

    /// The LLM's structured output could not be parsed as a `StepDecision`.
    #[error("LLM returned an unparseable step decision: {0}")]
    LlmOutput(String),

    /// `collect_state` could not gather a `BrowserStateSummary` in time.
    #[error("collecting browser state failed: {0}")]
    StateCollection(String),

    /// A whole step exceeded its wall-clock budget.
    #[error("step {0} timed out")]
    StepTimeout(u32),

    /// The browser session was not ready when the orchestrator started.
    #[error("browser session not ready: {0}")]
    BrowserNotReady(String),
}

impl AgentError {
    /// Helper for wrapping static string errors.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}
