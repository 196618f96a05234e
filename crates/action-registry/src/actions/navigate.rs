//! navigate, go_back, wait

use std::time::Duration;

use cdp_adapter::Cdp;

use crate::context::ActionDeps;
use crate::errors::ActionError;
use crate::types::{ActionResult, ExecCtx};

const NETWORK_ERROR_MARKERS: &[&str] = &[
    "ERR_NAME_NOT_RESOLVED",
    "ERR_INTERNET_DISCONNECTED",
    "ERR_CONNECTION_REFUSED",
    "ERR_TIMED_OUT",
    "net::",
];

pub async fn navigate(
    ctx: ExecCtx,
    params: serde_json::Value,
    deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let url = params
        .get("url")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ActionError::InvalidParams {
            action: "navigate".into(),
            detail: "missing 'url'".into(),
        })?;
    let adapter = deps
        .browser_session
        .ok_or_else(|| ActionError::Internal("navigate requires browser_session".into()))?;
    let resolved = adapter
        .resolve_execution_context(&ctx.route)
        .await
        .map_err(|e| ActionError::CdpIo(e.to_string()))?;

    match adapter.navigate(resolved.page, url, ctx.remaining_time()).await {
        Ok(()) => {
            let memory = format!("Navigated to {url}");
            Ok(ActionResult::ok(memory))
        }
        Err(err) => {
            let message = err.to_string();
            if NETWORK_ERROR_MARKERS.iter().any(|marker| message.contains(marker)) {
                Ok(ActionResult::err(format!(
                    "Navigation failed, site unavailable: {url}"
                )))
            } else {
                Ok(ActionResult::err(format!("Navigation failed: {message}")))
            }
        }
    }
}

pub async fn go_back(
    ctx: ExecCtx,
    _params: serde_json::Value,
    deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let adapter = deps
        .browser_session
        .ok_or_else(|| ActionError::Internal("go_back requires browser_session".into()))?;
    let resolved = adapter
        .resolve_execution_context(&ctx.route)
        .await
        .map_err(|e| ActionError::CdpIo(e.to_string()))?;
    match adapter.go_back(resolved.page, ctx.remaining_time()).await {
        Ok(()) => Ok(ActionResult::ok("Navigated back")),
        Err(err) => Ok(ActionResult::err(format!("Failed to go back: {err}"))),
    }
}

/// Clamp formula matches the upstream convention: the first second of the
/// requested wait is assumed to already be spent on bookkeeping around the
/// call, and no single wait may exceed 30 seconds.
pub fn clamp_wait_seconds(requested: i64) -> u64 {
    requested.saturating_sub(1).clamp(0, 30) as u64
}

pub async fn wait(
    _ctx: ExecCtx,
    params: serde_json::Value,
    _deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let seconds = params.get("seconds").and_then(|v| v.as_i64()).unwrap_or(3);
    let actual = clamp_wait_seconds(seconds);
    tokio::time::sleep(Duration::from_secs(actual)).await;
    Ok(ActionResult::ok(format!("Waited {seconds} seconds")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_within_zero_to_thirty() {
        assert_eq!(clamp_wait_seconds(0), 0);
        assert_eq!(clamp_wait_seconds(1), 0);
        assert_eq!(clamp_wait_seconds(3), 2);
        assert_eq!(clamp_wait_seconds(100), 30);
    }
}
