//! screenshot: flags the next observation to include a captured frame
//! rather than actually capturing one here — the agent loop takes the
//! screenshot once it's building the next prompt, after any pending DOM
//! settle wait.

use crate::context::ActionDeps;
use crate::errors::ActionError;
use crate::types::{ActionResult, ExecCtx};

pub async fn screenshot(
    _ctx: ExecCtx,
    _params: serde_json::Value,
    _deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    Ok(
        ActionResult::ok("Screenshot requested for the next observation")
            .with_metadata(serde_json::json!({ "include_screenshot": true })),
    )
}
