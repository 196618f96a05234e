//! done: the terminal action. Ends the agent loop.

use crate::context::ActionDeps;
use crate::errors::ActionError;
use crate::types::{ActionResult, ExecCtx};

pub async fn done(
    _ctx: ExecCtx,
    params: serde_json::Value,
    _deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let success = params.get("success").and_then(|v| v.as_bool()).unwrap_or(false);
    let text = params
        .get("text")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let data = params.get("data").cloned();

    Ok(ActionResult::done(success, text, data)
        .with_memory(format!("Task completed. Success status: {success}")))
}
