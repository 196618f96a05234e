//! Offline variable detection: scans a completed run's history for values
//! worth promoting to reusable named variables (email, phone, date, name,
//! address), so a rerun can substitute fresh data without re-prompting the
//! model for every field.

use std::collections::BTreeMap;

use regex::Regex;

use super::types::{AgentAction, AgentHistoryEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VariableKind {
    Email,
    Phone,
    Date,
    Name,
    Address,
}

#[derive(Debug, Clone)]
pub struct DetectedVariable {
    pub kind: VariableKind,
    pub name: String,
    pub value: String,
}

/// Element-attribute keywords that identify a field's kind, checked before
/// falling back to regex matching on the typed value itself.
fn kind_from_attribute_hint(hint: &str) -> Option<VariableKind> {
    let hint = hint.to_lowercase();
    if hint.contains("email") {
        Some(VariableKind::Email)
    } else if hint.contains("phone") || hint.contains("tel") {
        Some(VariableKind::Phone)
    } else if hint.contains("date") || hint.contains("dob") || hint.contains("birth") {
        Some(VariableKind::Date)
    } else if hint.contains("name") {
        Some(VariableKind::Name)
    } else if hint.contains("address") || hint.contains("street") || hint.contains("city") {
        Some(VariableKind::Address)
    } else {
        None
    }
}

fn kind_from_value(value: &str) -> Option<VariableKind> {
    let email = Regex::new(r"^[\w.+-]+@[\w-]+\.[\w.-]+$").unwrap();
    let phone = Regex::new(r"^\+?[0-9][0-9()\-. ]{6,}[0-9]$").unwrap();
    let date = Regex::new(r"^\d{4}-\d{2}-\d{2}$|^\d{1,2}/\d{1,2}/\d{2,4}$").unwrap();
    if email.is_match(value) {
        Some(VariableKind::Email)
    } else if phone.is_match(value) {
        Some(VariableKind::Phone)
    } else if date.is_match(value) {
        Some(VariableKind::Date)
    } else {
        None
    }
}

/// Walks `history`'s `input` actions, classifying each typed value by the
/// field's own attributes first and a value-shape regex second, then
/// deduplicates by value and renames on collision (`email`, `email_2`, ...).
pub fn detect_variables(history: &[AgentHistoryEntry]) -> Vec<DetectedVariable> {
    let mut by_value: BTreeMap<String, VariableKind> = BTreeMap::new();

    for entry in history {
        for action in &entry.decision.action {
            if let Some((kind, value)) = classify_input_action(action) {
                by_value.entry(value).or_insert(kind);
            }
        }
    }

    let mut counts: BTreeMap<VariableKind, u32> = BTreeMap::new();
    let mut out = Vec::new();
    for (value, kind) in by_value {
        let count = counts.entry(kind).or_insert(0);
        *count += 1;
        let base = kind_label(kind);
        let name = if *count == 1 {
            base.to_string()
        } else {
            format!("{base}_{count}")
        };
        out.push(DetectedVariable { kind, name, value });
    }
    out
}

fn classify_input_action(action: &AgentAction) -> Option<(VariableKind, String)> {
    if action.action != "input" {
        return None;
    }
    let value = action.params.get("text")?.as_str()?.to_string();
    if value.trim().is_empty() {
        return None;
    }
    let attribute_hint = action
        .params
        .get("field_hint")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let kind = kind_from_attribute_hint(attribute_hint).or_else(|| kind_from_value(&value))?;
    Some((kind, value))
}

fn kind_label(kind: VariableKind) -> &'static str {
    match kind {
        VariableKind::Email => "email",
        VariableKind::Phone => "phone",
        VariableKind::Date => "date",
        VariableKind::Name => "name",
        VariableKind::Address => "address",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_loop::types::{StepDecision, StepExecutionResult};
    use action_registry::ActionResult;

    fn entry_with_input(text: &str, field_hint: &str) -> AgentHistoryEntry {
        AgentHistoryEntry {
            step_number: 1,
            decision: StepDecision {
                thinking: None,
                evaluation_previous_goal: String::new(),
                memory: String::new(),
                next_goal: String::new(),
                action: vec![AgentAction {
                    action: "input".to_string(),
                    params: serde_json::json!({ "text": text, "field_hint": field_hint }),
                }],
            },
            execution: StepExecutionResult {
                results: vec![ActionResult::ok("typed")],
            },
            metadata: Default::default(),
        }
    }

    #[test]
    fn detects_email_by_attribute_hint() {
        let history = vec![entry_with_input("person@example.com", "email_address")];
        let detected = detect_variables(&history);
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].kind, VariableKind::Email);
        assert_eq!(detected[0].name, "email");
    }

    #[test]
    fn detects_email_by_value_shape_without_hint() {
        let history = vec![entry_with_input("person@example.com", "")];
        let detected = detect_variables(&history);
        assert_eq!(detected[0].kind, VariableKind::Email);
    }

    #[test]
    fn renames_on_collision() {
        let history = vec![
            entry_with_input("a@example.com", "email"),
            entry_with_input("b@example.com", "email"),
        ];
        let detected = detect_variables(&history);
        assert_eq!(detected.len(), 2);
        assert_eq!(detected[0].name, "email");
        assert_eq!(detected[1].name, "email_2");
    }
}
