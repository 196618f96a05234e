//! send_keys: dispatch a chord of named keys (`Enter`, `Control+A`, ...) to
//! whatever element currently holds focus.

use cdp_adapter::Cdp;

use crate::context::ActionDeps;
use crate::errors::ActionError;
use crate::types::{ActionResult, ExecCtx};

pub async fn send_keys(
    ctx: ExecCtx,
    params: serde_json::Value,
    deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let keys = params
        .get("keys")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ActionError::InvalidParams {
            action: "send_keys".into(),
            detail: "missing 'keys'".into(),
        })?;
    let adapter = deps
        .browser_session
        .ok_or_else(|| ActionError::Internal("send_keys requires browser_session".into()))?;
    let resolved = adapter
        .resolve_execution_context(&ctx.route)
        .await
        .map_err(|e| ActionError::CdpIo(e.to_string()))?;

    // `:focus` re-targets whatever element already has focus rather than
    // stealing it, so the best-effort click `send_keys` performs internally
    // before dispatching key events is a no-op on the right element.
    match adapter
        .send_keys(resolved.page, ":focus", keys, ctx.remaining_time())
        .await
    {
        Ok(()) => Ok(ActionResult::ok(format!("Sent keys: {keys}"))),
        Err(err) => Ok(ActionResult::err(format!("Failed to send keys: {err}"))),
    }
}
