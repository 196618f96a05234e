//! extract: ask the page-extraction LLM a question about the current page's
//! text content, truncating to a character budget on natural boundaries.

use cdp_adapter::Cdp;
use soulbrowser_core_types::ChatMessage;

use crate::context::ActionDeps;
use crate::errors::ActionError;
use crate::types::{ActionResult, ExecCtx};

const MAX_CONTENT_CHARS: usize = 30_000;
const MEMORY_SIZE_LIMIT: usize = 1_000;

const EXTRACTION_SYSTEM_PROMPT: &str = "You are an expert at extracting data from the text of a webpage.\n\n\
<input>\nYou will be given a query and the text of a webpage.\n</input>\n\n\
<instructions>\n\
- You are tasked to extract information from the webpage that is relevant to the query.\n\
- Only use information available on the page; never invent or guess.\n\
- If the information is not available, say so explicitly.\n\
- If the query asks for all items of something, list all of them.\n\
- If the content was truncated, mention that start_from_char can be used to continue reading.\n\
</instructions>\n\n\
<output>\n\
- Present all relevant information concisely.\n\
- Do not answer conversationally; output the relevant information directly.\n\
</output>";

pub async fn extract(
    ctx: ExecCtx,
    params: serde_json::Value,
    deps: ActionDeps,
) -> Result<ActionResult, ActionError> {
    let query = params
        .get("query")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ActionError::InvalidParams {
            action: "extract".into(),
            detail: "missing 'query'".into(),
        })?;
    let start_from_char = params
        .get("start_from_char")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as usize;

    let adapter = deps
        .browser_session
        .clone()
        .ok_or_else(|| ActionError::Internal("extract requires browser_session".into()))?;
    let llm = deps
        .page_extraction_llm
        .clone()
        .ok_or_else(|| ActionError::Internal("extract requires page_extraction_llm".into()))?;

    let resolved = adapter
        .resolve_execution_context(&ctx.route)
        .await
        .map_err(|e| ActionError::CdpIo(e.to_string()))?;

    let page_text = adapter
        .evaluate_script_in_context(&resolved, "document.body ? document.body.innerText : ''")
        .await
        .map_err(|e| ActionError::CdpIo(e.to_string()))?;
    let mut content = page_text.as_str().unwrap_or_default().to_string();

    if start_from_char > 0 {
        if start_from_char >= content.len() {
            return Ok(ActionResult::err(format!(
                "start_from_char ({start_from_char}) exceeds content length of {} chars",
                content.len()
            )));
        }
        content = content[start_from_char..].to_string();
    }

    let (truncated_content, truncated, next_start_char) = truncate_on_boundary(&content, start_from_char);

    let page_url = adapter
        .get_current_page_url(resolved.page)
        .await
        .unwrap_or_default();

    let user_prompt = format!(
        "<query>\n{query}\n</query>\n\n<webpage_content>\n{truncated_content}\n</webpage_content>"
    );

    let messages = vec![
        ChatMessage::system(EXTRACTION_SYSTEM_PROMPT),
        ChatMessage::user(user_prompt),
    ];

    let response = tokio::time::timeout(std::time::Duration::from_secs(120), llm.invoke(messages))
        .await
        .map_err(|_| ActionError::Internal("extraction LLM call timed out".into()))?
        .map_err(|e| ActionError::Internal(e.to_string()))?;

    let mut formatted = format!("<url>\n{page_url}\n</url>\n<query>\n{query}\n</query>\n<result>\n{}\n</result>", response.completion);
    if truncated {
        formatted.push_str(&format!(
            "\n<truncated next_start_char=\"{next_start_char}\"/>"
        ));
    }

    let result = if formatted.len() < MEMORY_SIZE_LIMIT {
        ActionResult::ok(formatted)
    } else {
        let memory = format!(
            "Query: {query}\nResult: {}... (truncated, full content in extracted_content)",
            &formatted[..formatted.len().min(MEMORY_SIZE_LIMIT)]
        );
        ActionResult::ok(formatted).with_memory(memory).once()
    };

    Ok(result)
}

/// Truncate at the nearest paragraph break within the last 500 chars of the
/// budget, falling back to the nearest sentence break within the last 200.
fn truncate_on_boundary(content: &str, offset: usize) -> (String, bool, usize) {
    if content.len() <= MAX_CONTENT_CHARS {
        return (content.to_string(), false, offset + content.len());
    }

    let window_start = MAX_CONTENT_CHARS.saturating_sub(500);
    let mut cut = MAX_CONTENT_CHARS;
    if let Some(pos) = content[window_start..MAX_CONTENT_CHARS].rfind("\n\n") {
        cut = window_start + pos;
    } else {
        let sentence_start = MAX_CONTENT_CHARS.saturating_sub(200);
        if let Some(pos) = content[sentence_start..MAX_CONTENT_CHARS].rfind('.') {
            cut = sentence_start + pos + 1;
        }
    }
    (content[..cut].to_string(), true, offset + cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_short_content_untouched() {
        let (out, truncated, next) = truncate_on_boundary("hello world", 0);
        assert_eq!(out, "hello world");
        assert!(!truncated);
        assert_eq!(next, 11);
    }

    #[test]
    fn truncates_long_content_at_a_boundary() {
        let content = "a".repeat(MAX_CONTENT_CHARS + 1000);
        let (out, truncated, next) = truncate_on_boundary(&content, 0);
        assert!(truncated);
        assert!(out.len() <= MAX_CONTENT_CHARS);
        assert_eq!(next, out.len());
    }
}
