//! Error types for action dispatch.

use thiserror::Error;

/// Errors raised while resolving or executing a registered action.
#[derive(Debug, Error, Clone)]
pub enum ActionError {
    /// Navigation timed out waiting for page load.
    #[error("Navigation timeout: {0}")]
    NavTimeout(String),

    /// Wait operation timed out.
    #[error("Wait timeout: {0}")]
    WaitTimeout(String),

    /// Operation was cancelled or interrupted.
    #[error("Operation interrupted: {0}")]
    Interrupted(String),

    /// Element is not clickable (obscured, disabled, or not interactable).
    #[error("Element not clickable: {0}")]
    NotClickable(String),

    /// Element is not enabled for interaction.
    #[error("Element not enabled: {0}")]
    NotEnabled(String),

    /// Dropdown option was not found.
    #[error("Option not found in dropdown: {0}")]
    OptionNotFound(String),

    /// Index did not resolve to a node in the current selector map, most
    /// likely because the page changed since the map was built.
    #[error("Stale index {0}: page may have changed")]
    StaleIndex(i64),

    /// Scroll target is invalid or unreachable.
    #[error("Scroll target invalid: {0}")]
    ScrollTargetInvalid(String),

    /// Execution route became stale (frame navigation or reload).
    #[error("Stale route: {0}")]
    StaleRoute(String),

    /// CDP communication or protocol error.
    #[error("CDP I/O error: {0}")]
    CdpIo(String),

    /// Policy denied the operation.
    #[error("Policy denied: {0}")]
    PolicyDenied(String),

    /// Action name is not in the registry, or not available for the
    /// current URL after domain filtering.
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Params JSON did not match the action's declared shape.
    #[error("Invalid parameters for {action}: {detail}")]
    InvalidParams { action: String, detail: String },

    /// A handler declared a special parameter (e.g. `browser_session`,
    /// `page_extraction_llm`) that the caller did not supply.
    #[error("Action {action} requires '{param}' but none was provided")]
    MissingDependency { action: String, param: String },

    /// Internal error (should not happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    /// Whether retrying the same action again, unmodified, might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ActionError::WaitTimeout(_) | ActionError::NotClickable(_) | ActionError::CdpIo(_)
        )
    }

    /// Severity level (0=low, 1=medium, 2=high, 3=critical), used to decide
    /// whether a single failed action should count against the step's
    /// failure budget.
    pub fn severity(&self) -> u8 {
        match self {
            ActionError::Internal(_) | ActionError::StaleRoute(_) => 3,
            ActionError::NavTimeout(_) | ActionError::PolicyDenied(_) | ActionError::CdpIo(_) => 2,
            ActionError::WaitTimeout(_)
            | ActionError::StaleIndex(_)
            | ActionError::NotEnabled(_) => 1,
            _ => 0,
        }
    }
}
