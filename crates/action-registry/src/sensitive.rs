//! URL domain-glob matching and `<secret>name</secret>` substitution.
//!
//! Both concerns share one file because they're two faces of the same
//! feature: sensitive values are scoped to a domain pattern, and the same
//! glob syntax also gates which actions a URL is allowed to use.

use std::collections::BTreeMap;

use totp_rs::{Algorithm, Secret, TOTP};

/// `key -> value` pairs scoped to a domain glob, or an unscoped top-level
/// `key -> value` available on every page.
#[derive(Debug, Clone, Default)]
pub struct SensitiveDataMap {
    pub scoped: BTreeMap<String, BTreeMap<String, String>>,
    pub global: BTreeMap<String, String>,
}

impl SensitiveDataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_global(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.global.insert(key.into(), value.into());
    }

    pub fn insert_scoped(
        &mut self,
        domain_pattern: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.scoped
            .entry(domain_pattern.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Secrets visible on `current_url`: globals plus every scoped bucket
    /// whose domain pattern matches. Empty values are dropped.
    fn relevant_secrets(&self, current_url: Option<&str>) -> BTreeMap<String, String> {
        let mut out = self.global.clone();
        if let Some(url) = current_url {
            if !is_new_tab_page(url) {
                for (pattern, values) in &self.scoped {
                    if match_url_with_domain_pattern(url, pattern) {
                        out.extend(values.clone());
                    }
                }
            }
        }
        out.retain(|_, v| !v.is_empty());
        out
    }

    /// Key names (never values) visible on `current_url`, sorted, for the
    /// prompt's `<sensitive_data_description>` block.
    pub fn relevant_keys(&self, current_url: Option<&str>) -> Vec<String> {
        self.relevant_secrets(current_url).into_keys().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.scoped.values().all(|v| v.is_empty())
    }

    /// Every `key -> value` pair known anywhere, regardless of URL scope.
    /// Used only when redacting a conversation transcript before it's
    /// written to disk, never when deciding what's usable on a given page.
    pub fn all_entries(&self) -> BTreeMap<String, String> {
        let mut out = self.global.clone();
        for values in self.scoped.values() {
            out.extend(values.clone());
        }
        out.retain(|_, v| !v.is_empty());
        out
    }
}

/// Result of substituting `<secret>...</secret>` placeholders into a JSON
/// params blob.
pub struct SubstitutionOutcome {
    pub value: serde_json::Value,
    pub used: Vec<String>,
    pub missing: Vec<String>,
}

/// Name fragment that marks a placeholder as a TOTP seed rather than a
/// plain secret value, matching the upstream `bu_2fa_code` convention.
const TWO_FACTOR_MARKER: &str = "2fa_code";

/// Walk `params` recursively, replacing every `<secret>name</secret>` token
/// found inside a string value. Missing placeholders are left untouched
/// (tracked in `missing` rather than causing the dispatch to fail — the
/// agent sees the raw tag and can course-correct).
pub fn substitute(
    params: serde_json::Value,
    sensitive_data: &SensitiveDataMap,
    current_url: Option<&str>,
) -> SubstitutionOutcome {
    let secrets = sensitive_data.relevant_secrets(current_url);
    let mut used = Vec::new();
    let mut missing = Vec::new();
    let value = walk(params, &secrets, &mut used, &mut missing);
    used.sort();
    used.dedup();
    missing.sort();
    missing.dedup();
    SubstitutionOutcome {
        value,
        used,
        missing,
    }
}

fn walk(
    value: serde_json::Value,
    secrets: &BTreeMap<String, String>,
    used: &mut Vec<String>,
    missing: &mut Vec<String>,
) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => {
            serde_json::Value::String(replace_in_string(&s, secrets, used, missing))
        }
        serde_json::Value::Array(items) => serde_json::Value::Array(
            items
                .into_iter()
                .map(|item| walk(item, secrets, used, missing))
                .collect(),
        ),
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, walk(v, secrets, used, missing)))
                .collect(),
        ),
        other => other,
    }
}

fn replace_in_string(
    input: &str,
    secrets: &BTreeMap<String, String>,
    used: &mut Vec<String>,
    missing: &mut Vec<String>,
) -> String {
    const OPEN: &str = "<secret>";
    const CLOSE: &str = "</secret>";

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    loop {
        let Some(start) = rest.find(OPEN) else {
            out.push_str(rest);
            break;
        };
        let Some(end_rel) = rest[start + OPEN.len()..].find(CLOSE) else {
            out.push_str(rest);
            break;
        };
        let end = start + OPEN.len() + end_rel;
        let name = &rest[start + OPEN.len()..end];

        out.push_str(&rest[..start]);
        match resolve_placeholder(name, secrets) {
            Some(value) => {
                used.push(name.to_string());
                out.push_str(&value);
            }
            None => {
                missing.push(name.to_string());
                out.push_str(OPEN);
                out.push_str(name);
                out.push_str(CLOSE);
            }
        }
        rest = &rest[end + CLOSE.len()..];
    }
    out
}

fn resolve_placeholder(name: &str, secrets: &BTreeMap<String, String>) -> Option<String> {
    let seed = secrets.get(name)?;
    if name.contains(TWO_FACTOR_MARKER) {
        generate_totp(seed).or_else(|| Some(seed.clone()))
    } else {
        Some(seed.clone())
    }
}

fn generate_totp(base32_seed: &str) -> Option<String> {
    let secret = Secret::Encoded(base32_seed.to_string()).to_bytes().ok()?;
    let totp = TOTP::new(Algorithm::SHA1, 6, 1, 30, secret).ok()?;
    totp.generate_current().ok()
}

/// `about:blank` / `chrome://newtab` style URLs carry no meaningful origin,
/// so scoped secrets never leak onto them.
pub fn is_new_tab_page(url: &str) -> bool {
    matches!(
        url,
        "about:blank" | "chrome://new-tab-page/" | "chrome://newtab/" | ""
    ) || url.starts_with("chrome://new-tab-page")
}

/// Matches `url` against a pattern of the form `scheme://*.example.com/path*`.
/// `*` matches any run of characters (including none) within a single
/// component; comparison is case-insensitive on scheme and host.
pub fn match_url_with_domain_pattern(url: &str, pattern: &str) -> bool {
    let Some((pattern_scheme, pattern_rest)) = pattern.split_once("://") else {
        return glob_match(&pattern.to_ascii_lowercase(), &url.to_ascii_lowercase());
    };
    let Some((url_scheme, url_rest)) = url.split_once("://") else {
        return false;
    };
    if !glob_match(
        &pattern_scheme.to_ascii_lowercase(),
        &url_scheme.to_ascii_lowercase(),
    ) {
        return false;
    }

    let (pattern_host, pattern_path) = split_host_path(pattern_rest);
    let (url_host, url_path) = split_host_path(url_rest);

    if !glob_match(
        &pattern_host.to_ascii_lowercase(),
        &url_host.to_ascii_lowercase(),
    ) {
        return false;
    }

    pattern_path.is_empty() || glob_match(pattern_path, url_path)
}

fn split_host_path(rest: &str) -> (&str, &str) {
    match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    }
}

/// Minimal `*`-only glob matcher (no `?`, no character classes — domain
/// patterns never need them).
fn glob_match(pattern: &str, text: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = text.chars().collect();
    glob_match_rec(&pat, &txt)
}

fn glob_match_rec(pattern: &[char], text: &[char]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some('*') => {
            glob_match_rec(&pattern[1..], text)
                || (!text.is_empty() && glob_match_rec(pattern, &text[1..]))
        }
        Some(c) => text.first() == Some(c) && glob_match_rec(&pattern[1..], &text[1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_wildcard_subdomain() {
        assert!(match_url_with_domain_pattern(
            "https://accounts.example.com/login",
            "https://*.example.com/*"
        ));
    }

    #[test]
    fn rejects_different_scheme() {
        assert!(!match_url_with_domain_pattern(
            "http://example.com/",
            "https://example.com/*"
        ));
    }

    #[test]
    fn rejects_unrelated_domain() {
        assert!(!match_url_with_domain_pattern(
            "https://evil.com/example.com",
            "https://*.example.com/*"
        ));
    }

    #[test]
    fn substitutes_known_placeholder_and_tracks_usage() {
        let mut data = SensitiveDataMap::new();
        data.insert_global("x_username", "alice");
        let params = serde_json::json!({ "text": "<secret>x_username</secret>" });
        let outcome = substitute(params, &data, Some("https://example.com"));
        assert_eq!(outcome.value["text"], "alice");
        assert_eq!(outcome.used, vec!["x_username".to_string()]);
        assert!(outcome.missing.is_empty());
    }

    #[test]
    fn leaves_missing_placeholder_untouched_and_tracked() {
        let data = SensitiveDataMap::new();
        let params = serde_json::json!({ "text": "<secret>x_password</secret>" });
        let outcome = substitute(params, &data, None);
        assert_eq!(outcome.value["text"], "<secret>x_password</secret>");
        assert_eq!(outcome.missing, vec!["x_password".to_string()]);
    }

    #[test]
    fn scoped_secret_only_applies_on_matching_domain() {
        let mut data = SensitiveDataMap::new();
        data.insert_scoped("https://*.example.com/*", "x_token", "scoped-value");
        let params = serde_json::json!("<secret>x_token</secret>");

        let on_domain = substitute(params.clone(), &data, Some("https://app.example.com/x"));
        assert_eq!(on_domain.value, "scoped-value");

        let off_domain = substitute(params, &data, Some("https://other.com/x"));
        assert_eq!(off_domain.value, "<secret>x_token</secret>");
    }
}
