//! Layered application configuration: browser profile plus agent-loop
//! tunables, assembled from defaults, an optional config file, and
//! environment overrides via the `config` crate.

use std::path::PathBuf;

use agent_core::AgentLoopConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::errors::SoulBrowserError;

/// Browser-profile half of the layered config: everything `cdp-adapter`
/// needs to launch or attach to a Chromium instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BrowserProfile {
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default)]
    pub window_size: Option<(u32, u32)>,
    #[serde(default)]
    pub storage_state_path: Option<PathBuf>,
    #[serde(default)]
    pub allowed_domains: Vec<String>,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
}

fn default_headless() -> bool {
    false
}

impl Default for BrowserProfile {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            window_size: None,
            storage_state_path: None,
            allowed_domains: Vec::new(),
            proxy_url: None,
            chrome_executable: None,
        }
    }
}

/// LLM connection settings, read from the environment per §6's variable
/// list (provider key, model selector) rather than a committed file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout_ms() -> u64 {
    60_000
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key: String::new(),
            timeout_ms: default_llm_timeout_ms(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserProfile,
    #[serde(default)]
    pub agent: AgentLoopConfig,
    #[serde(default)]
    pub llm: LlmSettings,
}

impl AppConfig {
    /// Assembles config from, in increasing precedence: built-in defaults,
    /// `<user config dir>/soulbrowser/config.toml` if present, an explicit
    /// `config_file` if given, then `SOULBROWSER_*` environment overrides.
    pub fn load(config_file: Option<PathBuf>) -> Result<Self, SoulBrowserError> {
        let mut builder = Config::builder();

        if let Some(dir) = dirs::config_dir() {
            let user_file = dir.join("soulbrowser").join("config.toml");
            if user_file.exists() {
                builder = builder.add_source(File::from(user_file));
            }
        }

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("SOULBROWSER")
                .separator("__")
                .try_parsing(true),
        );

        // LLM provider keys follow the conventional unprefixed env var name.
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            builder = builder.set_override("llm.api_key", key).map_err(|e| {
                SoulBrowserError::internal(&format!("setting llm.api_key override: {e}"))
            })?;
        }

        let config = builder
            .build()
            .map_err(|e| SoulBrowserError::internal(&format!("assembling config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| SoulBrowserError::validation_error("invalid configuration", &e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_browser_profile() {
        let profile = BrowserProfile::default();
        assert!(!profile.headless);
        assert!(profile.allowed_domains.is_empty());
    }

    #[test]
    fn default_llm_settings_point_at_openai() {
        let llm = LlmSettings::default();
        assert_eq!(llm.model, "gpt-4o-mini");
        assert!(llm.api_base.starts_with("https://"));
    }

    #[test]
    fn load_reads_explicit_config_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[llm]\nmodel = \"gpt-4o\"\n").expect("write temp config");

        let config = AppConfig::load(Some(path)).expect("load config");
        assert_eq!(config.llm.model, "gpt-4o");
        assert!(!config.browser.headless);
    }
}
