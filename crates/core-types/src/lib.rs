#![allow(dead_code)]

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

pub mod chat_model;
pub use chat_model::{ChatCompletion, ChatMessage, ChatModel, ChatRole};

/// Shared error type stub for the L1 unified kernel crates.
#[derive(Debug, Error, Clone)]
pub enum SoulError {
    #[error("{message}")]
    Message { message: String },
}

impl SoulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PageId(pub String);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FrameId(pub String);

impl FrameId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RoutePrefer {
    Focused,
    RecentNav,
    MainFrame,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RoutingHint {
    pub session: Option<SessionId>,
    pub page: Option<PageId>,
    pub frame: Option<FrameId>,
    pub prefer: Option<RoutePrefer>,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExecRoute {
    pub session: SessionId,
    pub page: PageId,
    pub frame: FrameId,
    pub mutex_key: String,
}

impl ExecRoute {
    pub fn new(session: SessionId, page: PageId, frame: FrameId) -> Self {
        let mutex_key = format!("frame:{}", frame.0);
        Self {
            session,
            page,
            frame,
            mutex_key,
        }
    }
}

impl fmt::Display for ExecRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "session={} page={} frame={} mutex={}",
            self.session.0, self.page.0, self.frame.0, self.mutex_key
        )
    }
}

/// Placeholder ToolCall representation; to be replaced with the full struct during Phase 2.
#[cfg(feature = "serde-full")]
pub type ToolPayload = serde_json::Value;

#[cfg(not(feature = "serde-full"))]
pub type ToolPayload = ();

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ToolCall {
    pub call_id: Option<String>,
    pub task_id: Option<TaskId>,
    pub tool: String,
    pub payload: ToolPayload,
}
#[cfg(feature = "serde-full")]
use serde_json;

/// Backend node identifier as reported by `DOM.describeNode`. Stable for the
/// lifetime of a single DOM snapshot, not across navigations.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct BackendNodeId(pub i64);

/// Stable fingerprint of an element's structural identity, used to re-resolve
/// an index across DOM rebuilds when replaying a recorded step (rerun).
///
/// Computed as the first 16 hex characters of SHA-256 over the element's
/// tag path joined with its sorted static attributes. Two elements with the
/// same hash are treated as the same logical target even if their backend
/// node id or index changed between snapshots.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ElementHash(pub String);

impl ElementHash {
    pub fn compute(tag_path: &str, static_attrs: &[(String, String)]) -> Self {
        use sha2::{Digest, Sha256};

        let mut sorted = static_attrs.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut hasher = Sha256::new();
        hasher.update(tag_path.as_bytes());
        for (key, value) in &sorted {
            hasher.update(b"\0");
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
        }

        let digest = hasher.finalize();
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        Self(hex[..16].to_string())
    }
}

impl fmt::Display for ElementHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_hash_is_stable_for_same_inputs() {
        let attrs = vec![
            ("id".to_string(), "submit".to_string()),
            ("type".to_string(), "button".to_string()),
        ];
        let a = ElementHash::compute("html>body>form>button", &attrs);
        let b = ElementHash::compute("html>body>form>button", &attrs);
        assert_eq!(a, b);
        assert_eq!(a.0.len(), 16);
    }

    #[test]
    fn element_hash_ignores_attribute_order() {
        let forward = vec![
            ("id".to_string(), "submit".to_string()),
            ("type".to_string(), "button".to_string()),
        ];
        let reversed = vec![
            ("type".to_string(), "button".to_string()),
            ("id".to_string(), "submit".to_string()),
        ];
        assert_eq!(
            ElementHash::compute("html>body>form>button", &forward),
            ElementHash::compute("html>body>form>button", &reversed)
        );
    }

    #[test]
    fn element_hash_differs_on_tag_path() {
        let attrs = vec![("id".to_string(), "submit".to_string())];
        assert_ne!(
            ElementHash::compute("html>body>button", &attrs),
            ElementHash::compute("html>body>div>button", &attrs)
        );
    }
}
