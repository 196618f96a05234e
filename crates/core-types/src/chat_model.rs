//! Minimal capability surface for the LLM backends the agent talks to.
//!
//! Kept deliberately thin: one request type, one response type, one trait.
//! Concrete providers (Anthropic, OpenAI, Zhipu, ...) live in higher-level
//! crates and implement this trait; nothing below the action/agent layer
//! should need to know which provider is wired in.

use async_trait::async_trait;

use crate::SoulError;

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChatCompletion {
    pub completion: String,
}

/// Capability a step's prompt is sent through: plan generation (C5) and
/// page-content extraction (C2's `extract` action) both go through the same
/// trait, just with different message sets and timeouts set by the caller.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn invoke(&self, messages: Vec<ChatMessage>) -> Result<ChatCompletion, SoulError>;
}
