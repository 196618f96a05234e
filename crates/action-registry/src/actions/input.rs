//! input: type text into an indexed element, optionally clearing first and
//! pressing Enter afterwards.

use cdp_adapter::Cdp;

use crate::context::ActionDeps;
use crate::errors::ActionError;
use crate::selector::{build_selector, resolve_index};
use crate::types::{ActionResult, ExecCtx};

pub async fn input(
    ctx: ExecCtx,
    params: serde_json::Value,
    deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let index = params
        .get("index")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| ActionError::InvalidParams {
            action: "input".into(),
            detail: "missing 'index'".into(),
        })?;
    let text = params
        .get("text")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ActionError::InvalidParams {
            action: "input".into(),
            detail: "missing 'text'".into(),
        })?;
    let clear = params.get("clear").and_then(|v| v.as_bool()).unwrap_or(true);
    let press_enter = params
        .get("press_enter")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let map = deps
        .selector_map
        .clone()
        .ok_or_else(|| ActionError::Internal("input requires a selector map".into()))?;
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
        .clone()
        .ok_or_else(|| ActionError::Internal("input requires browser_session".into()))?;
    let resolved = adapter
        .resolve_execution_context(&ctx.route)
        .await
        .map_err(|e| ActionError::CdpIo(e.to_string()))?;

    if clear {
        let selector_literal = serde_json::to_string(&selector).unwrap_or_default();
        let expr = format!(
            "(() => {{ const el = document.querySelector({selector_literal}); if (el) {{ el.value = ''; el.dispatchEvent(new Event('input', {{ bubbles: true }})); }} }})()"
        );
        let _ = adapter.evaluate_script_in_context(&resolved, &expr).await;
    }

    if let Err(err) = adapter
        .type_text_in_context(&resolved, &selector, text, ctx.remaining_time())
        .await
    {
        return Ok(ActionResult::err(format!(
            "Failed to type into element {index}: {err}"
        )));
    }

    let sensitive_key = sensitive_key_used(text, &deps);
    let mut memory = if deps.has_sensitive_data {
        match &sensitive_key {
            Some(name) => format!("Entered {name}"),
            None => "Entered sensitive data".to_string(),
        }
    } else {
        format!("Entered '{text}'")
    };

    if press_enter {
        if adapter
            .send_keys(resolved.page, ":focus", "Enter", ctx.remaining_time())
            .await
            .is_ok()
        {
            memory.push_str(" and pressed Enter");
        }
    }

    Ok(ActionResult::ok(memory.clone()).with_metadata(serde_json::json!({ "index": index })))
}

/// `<secret>name</secret>` is replaced before `input` ever sees `text`, so by
/// the time we're here we can only detect that substitution happened if the
/// resolved value matches one of the still-known secret values. Used purely
/// to avoid echoing the literal secret value into history.
fn sensitive_key_used(text: &str, deps: &ActionDeps) -> Option<String> {
    let data = deps.sensitive_data.as_ref()?;
    data.global
        .iter()
        .chain(data.scoped.values().flat_map(|m| m.iter()))
        .find(|(_, v)| v.as_str() == text)
        .map(|(k, _)| k.clone())
}
