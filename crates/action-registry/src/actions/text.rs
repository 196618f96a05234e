//! find_text, click_text, click_role: text- and ARIA-role-addressed actions
//! that don't need an index, evaluated directly against the live DOM.

use cdp_adapter::Cdp;

use crate::context::ActionDeps;
use crate::errors::ActionError;
use crate::types::{ActionResult, ExecCtx};

const SIMULATE_CLICK_JS: &str = r#"
function simulateClick(el) {
    el.scrollIntoView({behavior: 'instant', block: 'center'});
    const rect = el.getBoundingClientRect();
    const x = rect.left + rect.width / 2;
    const y = rect.top + rect.height / 2;
    const opts = {bubbles: true, cancelable: true, view: window, clientX: x, clientY: y};
    el.dispatchEvent(new MouseEvent('mouseenter', opts));
    el.dispatchEvent(new MouseEvent('mouseover', opts));
    el.dispatchEvent(new MouseEvent('mousedown', {...opts, button: 0}));
    el.dispatchEvent(new MouseEvent('mouseup', {...opts, button: 0}));
    el.dispatchEvent(new MouseEvent('click', {...opts, button: 0}));
    if (el.click) el.click();
}
"#;

pub async fn find_text(
    ctx: ExecCtx,
    params: serde_json::Value,
    deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let text = params
        .get("text")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ActionError::InvalidParams {
            action: "find_text".into(),
            detail: "missing 'text'".into(),
        })?;
    let adapter = deps
        .browser_session
        .ok_or_else(|| ActionError::Internal("find_text requires browser_session".into()))?;
    let resolved = adapter
        .resolve_execution_context(&ctx.route)
        .await
        .map_err(|e| ActionError::CdpIo(e.to_string()))?;

    match adapter
        .scroll_to_text(resolved.page, text, ctx.remaining_time())
        .await
    {
        Ok(()) => Ok(ActionResult::ok(format!("Scrolled to text: {text}"))),
        Err(_) => Ok(ActionResult::ok(format!(
            "Text '{text}' was not found or is not visible on the page"
        ))
        .with_memory(format!("Attempt to scroll to '{text}' failed, text not found"))),
    }
}

pub async fn click_text(
    ctx: ExecCtx,
    params: serde_json::Value,
    deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let text = params
        .get("text")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ActionError::InvalidParams {
            action: "click_text".into(),
            detail: "missing 'text'".into(),
        })?;
    let exact = params.get("exact").and_then(|v| v.as_bool()).unwrap_or(false);

    let script = format!(
        r#"(() => {{
    {simulate}
    const text = {text};
    const exact = {exact};
    const primary = document.querySelectorAll('a, button, [role="button"], input[type="submit"], input[type="button"]');
    for (const el of primary) {{
        const elText = el.textContent || el.innerText || el.value || '';
        if (exact ? elText.trim() === text : elText.toLowerCase().includes(text.toLowerCase())) {{
            simulateClick(el);
            return 'clicked: ' + elText.trim().substring(0, 50);
        }}
    }}
    const all = document.querySelectorAll('*');
    for (const el of all) {{
        const elText = el.textContent || el.innerText || '';
        if (exact ? elText.trim() === text : elText.toLowerCase().includes(text.toLowerCase())) {{
            simulateClick(el);
            return 'clicked (fallback): ' + elText.trim().substring(0, 50);
        }}
    }}
    return 'not_found';
}})()"#,
        simulate = SIMULATE_CLICK_JS,
        text = serde_json::to_string(text).unwrap_or_default(),
        exact = exact,
    );

    run_click_script(ctx, deps, &script, || format!("Text '{text}' was not found on the page")).await
}

pub async fn click_role(
    ctx: ExecCtx,
    params: serde_json::Value,
    deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let role = params
        .get("role")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ActionError::InvalidParams {
            action: "click_role".into(),
            detail: "missing 'role'".into(),
        })?
        .to_ascii_lowercase();
    let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
    let exact = params.get("exact").and_then(|v| v.as_bool()).unwrap_or(false);

    let script = format!(
        r#"(() => {{
    {simulate}
    const roleSelectors = {{
        'button': 'button, [role="button"], input[type="button"], input[type="submit"]',
        'link': 'a, [role="link"]',
        'menuitem': '[role="menuitem"]',
        'checkbox': 'input[type="checkbox"], [role="checkbox"]',
        'radio': 'input[type="radio"], [role="radio"]',
    }};
    const role = {role};
    const name = {name};
    const exact = {exact};
    const selector = roleSelectors[role] || ('[role="' + role + '"]');
    const elements = document.querySelectorAll(selector);
    for (const el of elements) {{
        const elText = el.textContent || el.innerText || el.getAttribute('aria-label') || el.value || '';
        const nameMatch = !name || (exact ? elText.trim() === name : elText.toLowerCase().includes(name.toLowerCase()));
        if (nameMatch) {{
            simulateClick(el);
            return 'clicked: ' + elText.trim().substring(0, 50);
        }}
    }}
    return 'not_found';
}})()"#,
        simulate = SIMULATE_CLICK_JS,
        role = serde_json::to_string(&role).unwrap_or_default(),
        name = serde_json::to_string(name).unwrap_or_default(),
        exact = exact,
    );

    run_click_script(ctx, deps, &script, || {
        format!("No element with role '{role}' and name '{name}' was found")
    })
    .await
}

async fn run_click_script(
    ctx: ExecCtx,
    deps: ActionDeps,
    script: &str,
    not_found: impl FnOnce() -> String,
) -> Result<ActionResult, ActionError> {
    let adapter = deps
        .browser_session
        .ok_or_else(|| ActionError::Internal("requires browser_session".into()))?;
    let resolved = adapter
        .resolve_execution_context(&ctx.route)
        .await
        .map_err(|e| ActionError::CdpIo(e.to_string()))?;

    let value = adapter
        .evaluate_script_in_context(&resolved, script)
        .await
        .map_err(|e| ActionError::CdpIo(e.to_string()))?;
    let outcome = value.as_str().unwrap_or("error");
    if outcome == "not_found" {
        Ok(ActionResult::ok(not_found()))
    } else {
        Ok(ActionResult::ok(outcome.to_string()))
    }
}
