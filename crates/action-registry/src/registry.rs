//! The action registry: name -> (spec, handler) map, plus the dispatcher
//! that validates special-parameter availability, substitutes sensitive
//! data, and runs the handler.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::{
    ActionSpec, PARAM_AVAILABLE_FILE_PATHS, PARAM_BROWSER_SESSION, PARAM_CDP_CLIENT,
    PARAM_FILE_SYSTEM, PARAM_HAS_SENSITIVE_DATA, PARAM_PAGE_EXTRACTION_LLM, PARAM_PAGE_URL,
    PARAM_SENSITIVE_DATA,
};
use crate::context::ActionDeps;
use crate::errors::ActionError;
use crate::sensitive;
use crate::types::{ActionResult, ExecCtx};

pub type ActionFuture = Pin<Box<dyn Future<Output = Result<ActionResult, ActionError>> + Send>>;
pub type ActionHandler =
    Arc<dyn Fn(ExecCtx, serde_json::Value, ActionDeps) -> ActionFuture + Send + Sync>;

struct Registered {
    spec: ActionSpec,
    handler: ActionHandler,
}

/// Holds every registered action and dispatches named invocations into them.
#[derive(Default)]
pub struct ActionRegistry {
    actions: BTreeMap<&'static str, Registered>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&mut self, spec: ActionSpec, handler: F)
    where
        F: Fn(ExecCtx, serde_json::Value, ActionDeps) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ActionResult, ActionError>> + Send + 'static,
    {
        let name = spec.name;
        let handler: ActionHandler = Arc::new(move |ctx, params, deps| Box::pin(handler(ctx, params, deps)));
        self.actions.insert(name, Registered { spec, handler });
    }

    pub fn spec(&self, name: &str) -> Option<&ActionSpec> {
        self.actions.get(name).map(|r| &r.spec)
    }

    /// Actions the LLM may choose from at the current URL, in registration
    /// (alphabetical, since we key on a `BTreeMap`) order.
    pub fn available_actions(&self, page_url: Option<&str>) -> Vec<&ActionSpec> {
        self.actions
            .values()
            .map(|r| &r.spec)
            .filter(|spec| spec.available_for(page_url))
            .collect()
    }

    /// Flattened `name: description` listing for the prompt, restricted to
    /// actions available at `page_url`.
    pub fn prompt_description(&self, page_url: Option<&str>) -> String {
        self.available_actions(page_url)
            .into_iter()
            .map(|spec| format!("{}: {}", spec.name, spec.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Validate special-parameter availability, substitute sensitive data,
    /// and run the named handler.
    pub async fn dispatch(
        &self,
        action_name: &str,
        params: serde_json::Value,
        ctx: ExecCtx,
        mut deps: ActionDeps,
    ) -> Result<ActionResult, ActionError> {
        let registered = self
            .actions
            .get(action_name)
            .ok_or_else(|| ActionError::UnknownAction(action_name.to_string()))?;

        for required in [
            (PARAM_BROWSER_SESSION, deps.browser_session.is_some()),
            (PARAM_CDP_CLIENT, deps.cdp_client.is_some()),
            (PARAM_PAGE_EXTRACTION_LLM, deps.page_extraction_llm.is_some()),
            (PARAM_FILE_SYSTEM, deps.file_system.is_some()),
            (PARAM_AVAILABLE_FILE_PATHS, deps.available_file_paths.is_some()),
        ] {
            let (name, present) = required;
            if registered.spec.wants_param(name) && !present {
                return Err(ActionError::MissingDependency {
                    action: action_name.to_string(),
                    param: name.to_string(),
                });
            }
        }

        deps.has_sensitive_data = registered.spec.wants_param(PARAM_HAS_SENSITIVE_DATA)
            && deps
                .sensitive_data
                .as_ref()
                .map(|d| !d.global.is_empty() || !d.scoped.is_empty())
                .unwrap_or(false);

        if !registered.spec.wants_param(PARAM_SENSITIVE_DATA) {
            deps.sensitive_data = None;
        }
        if !registered.spec.wants_param(PARAM_PAGE_URL) {
            deps.page_url = None;
        }

        let params = if let Some(sensitive) = deps.sensitive_data.clone() {
            let outcome = sensitive::substitute(params, &sensitive, deps.page_url.as_deref());
            if !outcome.used.is_empty() {
                info!(
                    action = action_name,
                    placeholders = ?outcome.used,
                    "using sensitive data placeholders"
                );
            }
            if !outcome.missing.is_empty() {
                warn!(
                    action = action_name,
                    placeholders = ?outcome.missing,
                    "missing sensitive data placeholders"
                );
            }
            outcome.value
        } else {
            params
        };

        let result = (registered.handler)(ctx, params, deps).await;
        result.or_else(|err| match &err {
            ActionError::WaitTimeout(_) => Ok(ActionResult::err(
                "action was not executed due to timeout".to_string(),
            )),
            _ => Err(err),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ActionSpec;
    use std::time::{Duration, Instant};
    use tokio_util::sync::CancellationToken;

    fn ctx() -> ExecCtx {
        let route = soulbrowser_core_types::ExecRoute::new(
            soulbrowser_core_types::SessionId("s".into()),
            soulbrowser_core_types::PageId("p".into()),
            soulbrowser_core_types::FrameId("f".into()),
        );
        ExecCtx::new(route, Instant::now() + Duration::from_secs(5), CancellationToken::new())
    }

    #[tokio::test]
    async fn dispatch_rejects_unknown_action() {
        let registry = ActionRegistry::new();
        let err = registry
            .dispatch("nope", serde_json::json!({}), ctx(), ActionDeps::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::UnknownAction(_)));
    }

    #[tokio::test]
    async fn dispatch_rejects_missing_declared_dependency() {
        let mut registry = ActionRegistry::new();
        registry.register(
            ActionSpec::new("extract", "extract").wants(&[crate::catalog::PARAM_PAGE_EXTRACTION_LLM]),
            |_ctx, _params, _deps| async move { Ok(ActionResult::ok("done")) },
        );
        let err = registry
            .dispatch("extract", serde_json::json!({}), ctx(), ActionDeps::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::MissingDependency { .. }));
    }

    #[tokio::test]
    async fn dispatch_substitutes_sensitive_placeholders_before_calling_handler() {
        let mut registry = ActionRegistry::new();
        registry.register(
            ActionSpec::new("input", "input").wants(&[
                crate::catalog::PARAM_SENSITIVE_DATA,
                crate::catalog::PARAM_HAS_SENSITIVE_DATA,
            ]),
            |_ctx, params, deps| async move {
                assert!(deps.has_sensitive_data);
                Ok(ActionResult::ok(params["text"].as_str().unwrap().to_string()))
            },
        );
        let mut data = sensitive::SensitiveDataMap::new();
        data.insert_global("x_password", "hunter2");
        let deps = ActionDeps::default().with_sensitive_data(data);
        let result = registry
            .dispatch(
                "input",
                serde_json::json!({ "text": "<secret>x_password</secret>" }),
                ctx(),
                deps,
            )
            .await
            .unwrap();
        assert_eq!(result.extracted_content.as_deref(), Some("hunter2"));
    }

    #[tokio::test]
    async fn timeout_error_is_normalized_into_a_result() {
        let mut registry = ActionRegistry::new();
        registry.register(ActionSpec::new("wait", "wait"), |_ctx, _params, _deps| async move {
            Err(ActionError::WaitTimeout("deadline exceeded".into()))
        });
        let result = registry
            .dispatch("wait", serde_json::json!({}), ctx(), ActionDeps::default())
            .await
            .unwrap();
        assert_eq!(
            result.error.as_deref(),
            Some("action was not executed due to timeout")
        );
    }
}
