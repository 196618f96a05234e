//! A `ChatModel` implementor backed by any OpenAI-compatible chat
//! completions endpoint, wired into the orchestrator as the primary (and,
//! doubled up with a different model, the fallback) LLM.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use soulbrowser_core_types::{ChatCompletion, ChatMessage, ChatModel, ChatRole, SoulError};

use crate::config::LlmSettings;

pub struct OpenAiChatModel {
    client: Client,
    api_base: String,
    model: String,
    api_key: String,
}

impl OpenAiChatModel {
    pub fn new(settings: &LlmSettings) -> Result<Self, SoulError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| SoulError::new(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn invoke(&self, messages: Vec<ChatMessage>) -> Result<ChatCompletion, SoulError> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            response_format: ResponseFormat {
                r#type: "json_object".to_string(),
            },
            messages: messages.into_iter().map(WireMessage::from).collect(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SoulError::new(format!("chat completion request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            return Err(SoulError::new(format!(
                "chat completion provider returned {status}: {text}"
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| SoulError::new(format!("chat completion response invalid: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content.into_text())
            .ok_or_else(|| SoulError::new("chat completion response missing content"))?;

        Ok(ChatCompletion { completion: content })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    response_format: ResponseFormat,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

impl From<ChatMessage> for WireMessage {
    fn from(message: ChatMessage) -> Self {
        let role = match message.role {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        };
        Self {
            role,
            content: message.content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: ChatCompletionContent,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatCompletionContent {
    Text(String),
    Parts(Vec<ChatCompletionPart>),
}

impl ChatCompletionContent {
    fn into_text(self) -> Option<String> {
        match self {
            ChatCompletionContent::Text(value) => Some(value),
            ChatCompletionContent::Parts(parts) => {
                let text = parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("\n");
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionPart {
    #[serde(default)]
    text: Option<String>,
}
