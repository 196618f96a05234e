//! The `collect_state` substep: gathers a fresh `BrowserStateSummary` from
//! CDP and runs the raw DOM/accessibility/layout data through the DOM
//! projection pipeline.

use std::sync::Arc;

use base64::Engine;
use cdp_adapter::{AxSnapshotConfig, Cdp, CdpAdapter, DomSnapshotConfig, PageId};
use dom_projection::model::SelectorMap;
use dom_projection::pipeline;

use crate::errors::AgentError;

use super::types::{BrowserStateSummary, IndexedBrowserState, TabInfo};

/// Collects everything the message manager needs to render `<browser_state>`
/// for one step, plus the selector map the action registry dispatches
/// against. Returns `Err` if any CDP round trip fails; the orchestrator
/// treats that as a failed step rather than aborting the whole run.
pub async fn collect_state(
    cdp: &CdpAdapter,
    page: PageId,
    enable_vision: bool,
    device_pixel_ratio: f64,
) -> Result<IndexedBrowserState, AgentError> {
    let dom_root = cdp
        .dom_document(page)
        .await
        .map_err(|e| AgentError::StateCollection(format!("dom_document: {e}")))?;
    let dom_snapshot = cdp
        .dom_snapshot(page, DomSnapshotConfig::default())
        .await
        .map_err(|e| AgentError::StateCollection(format!("dom_snapshot: {e}")))?;
    let ax_snapshot = cdp
        .ax_snapshot(page, AxSnapshotConfig::default())
        .await
        .map_err(|e| AgentError::StateCollection(format!("ax_snapshot: {e}")))?;

    let projected = pipeline::build(
        &dom_root,
        &ax_snapshot.nodes,
        &dom_snapshot.raw,
        &dom_snapshot.strings,
        device_pixel_ratio,
    )
    .map_err(|e| AgentError::StateCollection(format!("dom projection: {e}")))?;

    let url = cdp
        .get_current_page_url(page)
        .await
        .map_err(|e| AgentError::StateCollection(format!("get_current_page_url: {e}")))?;
    let tabs = cdp
        .get_tabs()
        .await
        .map_err(|e| AgentError::StateCollection(format!("get_tabs: {e}")))?;

    let screenshot_base64 = if enable_vision {
        match cdp.screenshot(page, std::time::Duration::from_secs(10)).await {
            Ok(bytes) => Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            Err(e) => {
                tracing::warn!(error = %e, "screenshot capture failed, continuing without vision");
                None
            }
        }
    } else {
        None
    };

    let tabs: Vec<TabInfo> = tabs
        .into_iter()
        .map(|t| TabInfo {
            page_id: format!("{:?}", t.page),
            url: t.url,
            title: Some(t.title),
            is_active: t.page == page,
        })
        .collect();

    let scroll_info = projected.root.scroll_info;
    let summary = BrowserStateSummary {
        url,
        title: tabs.iter().find(|t| t.is_active).and_then(|t| t.title.clone()),
        tabs,
        dom_root: projected.root,
        llm_text: projected.llm_text,
        dom_truncated: projected.truncated,
        scroll_info,
        screenshot_base64,
        auto_closed_popups: Vec::new(),
        recent_events: Vec::new(),
    };

    Ok(IndexedBrowserState {
        summary,
        selector_map: Arc::new(projected.selector_map as SelectorMap),
    })
}
