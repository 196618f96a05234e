//! Wires the canonical action set into a fresh `ActionRegistry`.

use crate::actions::{click, done, dropdown, extract, input, navigate, screenshot, scroll, send_keys, text, user_input};
use crate::catalog::{ActionSpec, PARAM_HAS_SENSITIVE_DATA, PARAM_PAGE_EXTRACTION_LLM, PARAM_SENSITIVE_DATA};
use crate::registry::ActionRegistry;

/// The action union every agent run starts with, matching the canonical
/// set: navigation, waiting, DOM interaction, extraction, and control flow.
pub fn build_default_registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();

    registry.register(ActionSpec::new("navigate", "Navigate to a URL."), navigate::navigate);
    registry.register(
        ActionSpec::new("go_back", "Go back to the previous page."),
        navigate::go_back,
    );
    registry.register(
        ActionSpec::new("wait", "Wait for a number of seconds, up to 30."),
        navigate::wait,
    );
    registry.register(
        ActionSpec::new(
            "click",
            "Click an element. Provide either index (from the current browser state) or both coordinate_x and coordinate_y.",
        ),
        click::click,
    );
    registry.register(
        ActionSpec::new("input", "Type text into an indexed input field.")
            .wants(&[PARAM_SENSITIVE_DATA, PARAM_HAS_SENSITIVE_DATA]),
        input::input,
    );
    registry.register(
        ActionSpec::new(
            "scroll",
            "Scroll the page, or a scrollable element named by index, by a number of viewport pages (down=true/false, pages default 1.0).",
        ),
        scroll::scroll,
    );
    registry.register(
        ActionSpec::new("send_keys", "Send a key chord (e.g. Enter, Escape) to the focused element."),
        send_keys::send_keys,
    );
    registry.register(
        ActionSpec::new("find_text", "Scroll the page until the given text is visible."),
        text::find_text,
    );
    registry.register(
        ActionSpec::new("click_text", "Click the first element whose text matches."),
        text::click_text,
    );
    registry.register(
        ActionSpec::new("click_role", "Click the first element with the given ARIA role (and optional name)."),
        text::click_role,
    );
    registry.register(
        ActionSpec::new(
            "extract",
            "Ask a question about the current page's content; answered by a dedicated extraction model.",
        )
        .wants(&[PARAM_PAGE_EXTRACTION_LLM]),
        extract::extract,
    );
    registry.register(
        ActionSpec::new("dropdown_options", "List the options of a <select> element named by index."),
        dropdown::dropdown_options,
    );
    registry.register(
        ActionSpec::new("select_dropdown", "Select a <select> option by its visible label."),
        dropdown::select_dropdown,
    );
    registry.register(
        ActionSpec::new(
            "request_user_input",
            "Ask the human operator a question and wait for their reply (e.g. to solve a captcha).",
        ),
        user_input::request_user_input,
    );
    registry.register(
        ActionSpec::new(
            "wait_for_user_input",
            "Pause and wait for the human operator to finish manual entry (e.g. credentials, 2FA).",
        ),
        user_input::wait_for_user_input,
    );
    registry.register(
        ActionSpec::new("screenshot", "Request a screenshot alongside the next observation."),
        screenshot::screenshot,
    );
    registry.register(
        ActionSpec::new("done", "Finish the task with a success flag and a final text summary."),
        done::done,
    );

    registry
}
