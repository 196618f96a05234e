//! dropdown_options: list the options of a `<select>`.
//! select_dropdown: choose one by visible label.

use cdp_adapter::{Cdp, SelectSpec};

use crate::context::ActionDeps;
use crate::errors::ActionError;
use crate::selector::{build_selector, resolve_index};
use crate::types::{ActionResult, ExecCtx};

pub async fn dropdown_options(
    ctx: ExecCtx,
    params: serde_json::Value,
    deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let index = params
        .get("index")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| ActionError::InvalidParams {
            action: "dropdown_options".into(),
            detail: "missing 'index'".into(),
        })?;
    let map = deps
        .selector_map
        .clone()
        .ok_or_else(|| ActionError::Internal("dropdown_options requires a selector map".into()))?;
    let node = match resolve_index(&map, index) {
        Ok(node) => node,
        Err(_) => {
            return Ok(ActionResult::err(format!(
                "Element with index {index} is no longer available, the page may have changed"
            )))
        }
    };
    let selector = build_selector(node);

    let adapter = deps
        .browser_session
        .ok_or_else(|| ActionError::Internal("dropdown_options requires browser_session".into()))?;
    let resolved = adapter
        .resolve_execution_context(&ctx.route)
        .await
        .map_err(|e| ActionError::CdpIo(e.to_string()))?;

    match adapter
        .get_dropdown_options(resolved.page, &selector, ctx.remaining_time())
        .await
    {
        Ok(options) => {
            let listing = options
                .iter()
                .map(|o| format!("- {}", o.label))
                .collect::<Vec<_>>()
                .join("\n");
            let short_term = format!("{} options found for element {index}:\n{listing}", options.len());
            Ok(ActionResult::ok(short_term)
                .with_memory(format!("Read {} dropdown options for element {index}", options.len()))
                .once())
        }
        Err(err) => Ok(ActionResult::err(format!(
            "Failed to read dropdown options for element {index}: {err}"
        ))),
    }
}

pub async fn select_dropdown(
    ctx: ExecCtx,
    params: serde_json::Value,
    deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let index = params
        .get("index")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| ActionError::InvalidParams {
            action: "select_dropdown".into(),
            detail: "missing 'index'".into(),
        })?;
    let text = params
        .get("text")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ActionError::InvalidParams {
            action: "select_dropdown".into(),
            detail: "missing 'text'".into(),
        })?;

    let map = deps
        .selector_map
        .clone()
        .ok_or_else(|| ActionError::Internal("select_dropdown requires a selector map".into()))?;
    let node = match resolve_index(&map, index) {
        Ok(node) => node,
        Err(_) => {
            return Ok(ActionResult::err(format!(
                "Element with index {index} is no longer available, the page may have changed"
            )))
        }
    };
    let selector = build_selector(node);

    let adapter = deps
        .browser_session
        .ok_or_else(|| ActionError::Internal("select_dropdown requires browser_session".into()))?;
    let resolved = adapter
        .resolve_execution_context(&ctx.route)
        .await
        .map_err(|e| ActionError::CdpIo(e.to_string()))?;

    let spec = SelectSpec {
        selector,
        value: text.to_string(),
        match_label: true,
    };

    match adapter
        .select_option(resolved.page, spec, ctx.remaining_time())
        .await
    {
        Ok(()) => Ok(ActionResult::ok(format!("Selected option: {text}"))
            .with_memory(format!("Selected dropdown option '{text}' for element {index}"))),
        Err(err) => Ok(ActionResult::err(format!(
            "Failed to select option '{text}' for element {index}: {err}"
        ))),
    }
}
