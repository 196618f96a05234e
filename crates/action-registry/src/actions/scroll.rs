//! scroll: whole-page or, when `index` names a scrollable container, the
//! container itself. Distance is expressed in viewport pages.

use std::time::Duration;

use cdp_adapter::Cdp;

use crate::context::ActionDeps;
use crate::errors::ActionError;
use crate::selector::{build_selector, resolve_index};
use crate::types::{ActionResult, ExecCtx};

const FALLBACK_VIEWPORT_HEIGHT: f64 = 1000.0;

pub async fn scroll(
    ctx: ExecCtx,
    params: serde_json::Value,
    deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let index = params.get("index").and_then(|v| v.as_i64());
    let down = params.get("down").and_then(|v| v.as_bool()).unwrap_or(true);
    let pages = params.get("pages").and_then(|v| v.as_f64()).unwrap_or(1.0);

    let target_selector = match index {
        Some(0) | None => None,
        Some(index) => {
            let map = deps
                .selector_map
                .clone()
                .ok_or_else(|| ActionError::Internal("scroll requires a selector map".into()))?;
            match resolve_index(&map, index) {
                Ok(node) => Some(build_selector(node)),
                Err(_) => {
                    return Ok(ActionResult::err(format!(
                        "Element with index {index} was not found in the browser state"
                    )))
                }
            }
        }
    };

    let adapter = deps
        .browser_session
        .ok_or_else(|| ActionError::Internal("scroll requires browser_session".into()))?;
    let resolved = adapter
        .resolve_execution_context(&ctx.route)
        .await
        .map_err(|e| ActionError::CdpIo(e.to_string()))?;

    let viewport_height = adapter
        .evaluate_script_in_context(&resolved, "window.innerHeight")
        .await
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(FALLBACK_VIEWPORT_HEIGHT);

    let signed_pages = if down { pages } else { -pages };
    let pixels = signed_pages * viewport_height;

    let result = match &target_selector {
        Some(selector) => scroll_container(&adapter, &resolved, selector, pixels).await,
        None => adapter
            .scroll(resolved.page, 0.0, pixels)
            .await
            .map_err(|e| e.to_string()),
    };

    match result {
        Ok(()) => {
            tokio::time::sleep(Duration::from_millis(150)).await;
            let direction = if down { "down" } else { "up" };
            let memory = match index {
                Some(index) if index != 0 => {
                    format!("Scrolled {direction} element {index} by {pages} pages")
                }
                _ => format!("Scrolled {direction} by {pages} pages"),
            };
            Ok(ActionResult::ok(memory))
        }
        Err(err) => Ok(ActionResult::err(format!("Failed to scroll: {err}"))),
    }
}

async fn scroll_container(
    adapter: &cdp_adapter::CdpAdapter,
    resolved: &cdp_adapter::ResolvedExecutionContext,
    selector: &str,
    pixels: f64,
) -> Result<(), String> {
    let selector_literal = serde_json::to_string(selector).unwrap_or_default();
    let expr = format!(
        "(() => {{ const el = document.querySelector({selector_literal}); if (el) {{ el.scrollTop += {pixels}; }} }})()"
    );
    adapter
        .evaluate_script_in_context(resolved, &expr)
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
}
