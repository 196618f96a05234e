//! Shortens long URLs before they enter the prompt and restores them in the
//! model's structured output afterwards, so a tracking-parameter-laden URL
//! doesn't burn the context budget on every step it stays in history.

use std::collections::HashMap;

/// Replaces the query string and fragment of any URL whose combined length
/// exceeds `threshold` with a truncated placeholder, remembering the
/// original so it can be restored later in the same step.
#[derive(Default)]
pub struct UrlShortener {
    threshold: usize,
    restore: HashMap<String, String>,
}

impl UrlShortener {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            restore: HashMap::new(),
        }
    }

    /// Shortens `url` if needed, recording the mapping for later restoration.
    pub fn shorten(&mut self, url: &str) -> String {
        let Some((base, tail)) = split_query_and_fragment(url) else {
            return url.to_string();
        };
        if tail.len() <= self.threshold {
            return url.to_string();
        }
        let truncated: String = tail.chars().take(self.threshold).collect();
        let hash = short_hash(url);
        let shortened = format!("{base}?{truncated}…{hash}");
        self.restore.insert(shortened.clone(), url.to_string());
        shortened
    }

    /// Walks every string value in a JSON tree and restores any shortened
    /// URL back to its original, mutating `value` in place.
    pub fn restore_in(&self, value: &mut serde_json::Value) {
        match value {
            serde_json::Value::String(s) => {
                if let Some(original) = self.restore.get(s.as_str()) {
                    *s = original.clone();
                }
            }
            serde_json::Value::Array(items) => {
                for item in items {
                    self.restore_in(item);
                }
            }
            serde_json::Value::Object(map) => {
                for (_, v) in map.iter_mut() {
                    self.restore_in(v);
                }
            }
            _ => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.restore.is_empty()
    }
}

fn split_query_and_fragment(url: &str) -> Option<(&str, &str)> {
    let query_start = url.find('?')?;
    Some((&url[..query_start], &url[query_start + 1..]))
}

/// Short, stable hex digest used only to disambiguate two URLs that share
/// the same truncated prefix; not a security primitive.
fn short_hash(input: &str) -> String {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("{:07x}", hash & 0xFFF_FFFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_short_urls_untouched() {
        let mut shortener = UrlShortener::new(25);
        let url = "https://example.com/search?q=rust";
        assert_eq!(shortener.shorten(url), url);
        assert!(shortener.is_empty());
    }

    #[test]
    fn shortens_and_restores_long_query() {
        let mut shortener = UrlShortener::new(10);
        let url = "https://example.com/search?q=rust+async+runtime+comparison&utm_source=newsletter";
        let shortened = shortener.shorten(url);
        assert_ne!(shortened, url);
        assert!(shortened.starts_with("https://example.com/search?"));

        let mut payload = serde_json::json!({ "next_goal": shortened.clone() });
        shortener.restore_in(&mut payload);
        assert_eq!(payload["next_goal"], url);
    }

    #[test]
    fn urls_without_query_are_unaffected() {
        let mut shortener = UrlShortener::new(5);
        let url = "https://example.com/about";
        assert_eq!(shortener.shorten(url), url);
    }
}
