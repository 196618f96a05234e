//! The special-parameter bag the dispatcher injects into handlers.
//!
//! `ActionDeps` carries every special parameter SPEC_FULL §4.2 names; a
//! handler only actually receives the ones it declares in its `ActionSpec`
//! (see `catalog.rs`). The `has_sensitive_data` field is *not* set by the
//! caller — the dispatcher derives it from whether `sensitive_data` is both
//! present and non-empty for the action being run.

use std::sync::Arc;

use cdp_adapter::CdpAdapter;
use dom_projection::model::SelectorMap;
use soulbrowser_core_types::ChatModel;

use crate::sensitive::SensitiveDataMap;

/// A place a handler can persist content too large for the prompt (used by
/// `extract` when a result exceeds the inline memory threshold). Backed by
/// the local filesystem in the CLI binary; tests use an in-memory stub.
pub trait ActionFileSystem: Send + Sync {
    fn save(&self, name: &str, content: &str) -> std::io::Result<String>;
}

/// Prompts a human for input and blocks until they answer. Backed by stdin
/// in the CLI binary; tests supply a canned responder.
pub trait UserInputPrompt: Send + Sync {
    fn ask(&self, prompt: &str) -> String;
}

#[derive(Clone, Default)]
pub struct ActionDeps {
    pub browser_session: Option<Arc<CdpAdapter>>,
    pub page_url: Option<String>,
    pub cdp_client: Option<Arc<CdpAdapter>>,
    pub page_extraction_llm: Option<Arc<dyn ChatModel>>,
    pub available_file_paths: Option<Vec<String>>,
    pub file_system: Option<Arc<dyn ActionFileSystem>>,
    pub sensitive_data: Option<SensitiveDataMap>,
    pub has_sensitive_data: bool,
    /// The index -> node map the most recent DOM projection produced. Index
    /// based actions (click, input, scroll, dropdown_options) resolve
    /// against this; it is not one of the LLM-declared special params since
    /// every action that needs it requires it unconditionally.
    pub selector_map: Option<Arc<SelectorMap>>,
    /// Not one of the LLM-declared special params; wired in by the host
    /// application for `request_user_input`/`wait_for_user_input` only.
    pub user_input: Option<Arc<dyn UserInputPrompt>>,
}

impl ActionDeps {
    pub fn new(browser_session: Arc<CdpAdapter>) -> Self {
        Self {
            cdp_client: Some(browser_session.clone()),
            browser_session: Some(browser_session),
            ..Default::default()
        }
    }

    pub fn with_page_url(mut self, url: impl Into<String>) -> Self {
        self.page_url = Some(url.into());
        self
    }

    pub fn with_extraction_llm(mut self, llm: Arc<dyn ChatModel>) -> Self {
        self.page_extraction_llm = Some(llm);
        self
    }

    pub fn with_file_paths(mut self, paths: Vec<String>) -> Self {
        self.available_file_paths = Some(paths);
        self
    }

    pub fn with_file_system(mut self, fs: Arc<dyn ActionFileSystem>) -> Self {
        self.file_system = Some(fs);
        self
    }

    pub fn with_sensitive_data(mut self, data: SensitiveDataMap) -> Self {
        self.sensitive_data = Some(data);
        self
    }

    pub fn with_selector_map(mut self, map: Arc<SelectorMap>) -> Self {
        self.selector_map = Some(map);
        self
    }

    pub fn with_user_input(mut self, prompt: Arc<dyn UserInputPrompt>) -> Self {
        self.user_input = Some(prompt);
        self
    }
}
