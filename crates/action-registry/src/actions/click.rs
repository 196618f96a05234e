//! click: by index into the selector map, or by raw viewport coordinate.

use cdp_adapter::Cdp;

use crate::actions::dropdown::dropdown_options;
use crate::context::ActionDeps;
use crate::errors::ActionError;
use crate::selector::{build_selector, resolve_index};
use crate::types::{ActionResult, ExecCtx};

pub async fn click(
    ctx: ExecCtx,
    params: serde_json::Value,
    deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let index = params.get("index").and_then(|v| v.as_i64());
    let coord_x = params.get("coordinate_x").and_then(|v| v.as_f64());
    let coord_y = params.get("coordinate_y").and_then(|v| v.as_f64());

    match (index, coord_x, coord_y) {
        (Some(index), _, _) => click_by_index(ctx, index, deps).await,
        (None, Some(x), Some(y)) => click_by_coordinate(ctx, x, y, deps).await,
        _ => Ok(ActionResult::err(
            "Must provide either index or both coordinate_x and coordinate_y",
        )),
    }
}

async fn click_by_index(
    ctx: ExecCtx,
    index: i64,
    deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    if index < 0 {
        return Ok(ActionResult::err(format!(
            "Index {index} is invalid, indices must be >= 0"
        )));
    }
    let map = deps
        .selector_map
        .clone()
        .ok_or_else(|| ActionError::Internal("click requires a selector map".into()))?;
    let node = match resolve_index(&map, index) {
        Ok(node) => node,
        Err(_) => {
            return Ok(ActionResult::err(format!(
                "Element with index {index} is no longer available, the page may have changed"
            )))
        }
    };

    if node.tag_name.eq_ignore_ascii_case("select") {
        return dropdown_options(ctx, serde_json::json!({ "index": index }), deps).await;
    }

    let selector = build_selector(node);
    let adapter = deps
        .browser_session
        .clone()
        .ok_or_else(|| ActionError::Internal("click requires browser_session".into()))?;
    let resolved = adapter
        .resolve_execution_context(&ctx.route)
        .await
        .map_err(|e| ActionError::CdpIo(e.to_string()))?;

    match adapter
        .click_in_context(&resolved, &selector, ctx.remaining_time())
        .await
    {
        Ok(()) => {
            let memory = format!("Clicked element {index} (<{}>)", node.tag_name);
            Ok(ActionResult::ok(memory).with_metadata(serde_json::json!({ "index": index })))
        }
        Err(err) => Ok(ActionResult::err(format!(
            "Failed to click element {index}: {err}"
        ))),
    }
}

async fn click_by_coordinate(
    ctx: ExecCtx,
    x: f64,
    y: f64,
    deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let adapter = deps
        .browser_session
        .ok_or_else(|| ActionError::Internal("click requires browser_session".into()))?;
    let resolved = adapter
        .resolve_execution_context(&ctx.route)
        .await
        .map_err(|e| ActionError::CdpIo(e.to_string()))?;

    let press = serde_json::json!({
        "type": "mousePressed", "x": x, "y": y,
        "button": "left", "buttons": 1, "clickCount": 1, "pointerType": "mouse",
    });
    let release = serde_json::json!({
        "type": "mouseReleased", "x": x, "y": y,
        "button": "left", "buttons": 1, "clickCount": 1, "pointerType": "mouse",
    });
    adapter
        .dispatch_mouse_event(resolved.page, press)
        .await
        .map_err(|e| ActionError::CdpIo(e.to_string()))?;
    adapter
        .dispatch_mouse_event(resolved.page, release)
        .await
        .map_err(|e| ActionError::CdpIo(e.to_string()))?;

    Ok(ActionResult::ok(format!("Clicked coordinate ({x}, {y})"))
        .with_metadata(serde_json::json!({ "click_x": x, "click_y": y })))
}
