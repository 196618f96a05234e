//! request_user_input: ask a yes/no or free-form question mid-task (e.g. a
//! captcha needs solving). wait_for_user_input: block until the human
//! confirms they've finished manual entry (credentials, 2FA).

use crate::context::ActionDeps;
use crate::errors::ActionError;
use crate::types::{ActionResult, ExecCtx};

const CONFIRMATIONS: &[&str] = &["done", "yes"];

pub async fn request_user_input(
    _ctx: ExecCtx,
    params: serde_json::Value,
    deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let prompt = params
        .get("prompt")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ActionError::InvalidParams {
            action: "request_user_input".into(),
            detail: "missing 'prompt'".into(),
        })?;
    let asker = deps
        .user_input
        .ok_or_else(|| ActionError::Internal("request_user_input requires a user input prompt".into()))?;

    let answer = asker.ask(prompt);
    let normalized = answer.trim().to_ascii_lowercase();
    if CONFIRMATIONS.contains(&normalized.as_str()) {
        Ok(ActionResult::ok(
            "User confirmed the action was completed (e.g. captcha solved). Continuing the task.",
        )
        .with_memory("User solved a captcha or completed a requested manual step"))
    } else {
        Ok(ActionResult::ok(answer))
    }
}

pub async fn wait_for_user_input(
    _ctx: ExecCtx,
    params: serde_json::Value,
    deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let message = params
        .get("message")
        .and_then(|v| v.as_str())
        .unwrap_or("Please fill in the form in the browser (login, password, etc.)");
    let asker = deps
        .user_input
        .ok_or_else(|| ActionError::Internal("wait_for_user_input requires a user input prompt".into()))?;

    let prompt = format!("SECURITY: {message}\nType \"done\" once you've finished entering data in the browser.");
    let answer = asker.ask(&prompt);
    let normalized = answer.trim().to_ascii_lowercase();
    if CONFIRMATIONS.contains(&normalized.as_str()) {
        Ok(ActionResult::ok(
            "User confirmed they finished entering data. Continuing the task.",
        )
        .with_memory("User filled in a login/registration form in the browser"))
    } else {
        Ok(ActionResult::err(format!(
            "Unexpected reply: expected \"done\", got: {answer}"
        )))
    }
}
