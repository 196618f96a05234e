//! Action metadata: name, description, domain filter, declared special
//! parameters. This is the data the dispatcher consults before running a
//! handler, and what the prompt builder (C4) reads to describe the
//! available action union to the LLM.

use crate::sensitive::match_url_with_domain_pattern;

/// Names of the special parameters a handler may declare. Kept as string
/// constants (rather than an enum matched against `ActionDeps` fields by
/// hand) so a handler's `ActionSpec::special_params` list reads the same way
/// the dispatcher's injection logic does.
pub const PARAM_BROWSER_SESSION: &str = "browser_session";
pub const PARAM_PAGE_URL: &str = "page_url";
pub const PARAM_CDP_CLIENT: &str = "cdp_client";
pub const PARAM_PAGE_EXTRACTION_LLM: &str = "page_extraction_llm";
pub const PARAM_AVAILABLE_FILE_PATHS: &str = "available_file_paths";
pub const PARAM_HAS_SENSITIVE_DATA: &str = "has_sensitive_data";
pub const PARAM_FILE_SYSTEM: &str = "file_system";
pub const PARAM_SENSITIVE_DATA: &str = "sensitive_data";

#[derive(Clone)]
pub struct ActionSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// `None` means unconstrained: always available regardless of URL.
    pub domains: Option<Vec<String>>,
    pub special_params: &'static [&'static str],
}

impl ActionSpec {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            domains: None,
            special_params: &[],
        }
    }

    pub fn with_domains(mut self, domains: Vec<String>) -> Self {
        self.domains = Some(domains);
        self
    }

    pub fn wants(mut self, params: &'static [&'static str]) -> Self {
        self.special_params = params;
        self
    }

    pub fn wants_param(&self, name: &str) -> bool {
        self.special_params.contains(&name)
    }

    /// Whether this action should be offered to the LLM for `page_url`.
    /// Unconstrained actions are always available. A constrained action on
    /// an unknown/new-tab URL (`page_url = None`) is never offered.
    pub fn available_for(&self, page_url: Option<&str>) -> bool {
        match (&self.domains, page_url) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(patterns), Some(url)) => patterns
                .iter()
                .any(|pattern| match_url_with_domain_pattern(url, pattern)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconstrained_action_is_always_available() {
        let spec = ActionSpec::new("wait", "wait");
        assert!(spec.available_for(None));
        assert!(spec.available_for(Some("https://example.com")));
    }

    #[test]
    fn domain_constrained_action_is_hidden_on_new_tab() {
        let spec = ActionSpec::new("special", "").with_domains(vec!["https://*.bank.com/*".into()]);
        assert!(!spec.available_for(None));
        assert!(spec.available_for(Some("https://secure.bank.com/acct")));
        assert!(!spec.available_for(Some("https://example.com")));
    }
}
