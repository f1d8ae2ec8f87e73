//! Chat-completion rewrite backend.
//!
//! [`ChatRewriter`] sends the corrected transcript plus an instruction to an
//! OpenAI-style chat endpoint and returns the rewritten text. Callers treat
//! every error as a degrade signal, never as a session failure.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RewriteConfig;

// ---------------------------------------------------------------------------
// RewriteError
// ---------------------------------------------------------------------------

/// Failures of the rewrite backend. All of them degrade to the pre-rewrite
/// text upstream.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("rewrite request failed: {0}")]
    Request(String),

    #[error("rewrite request timed out")]
    Timeout,

    #[error("failed to parse rewrite response: {0}")]
    Parse(String),

    #[error("rewrite response contained no text")]
    EmptyResponse,
}

// ---------------------------------------------------------------------------
// PromptRewriting
// ---------------------------------------------------------------------------

/// A backend that rewrites `text` according to `instruction`.
#[async_trait]
pub trait PromptRewriting: Send + Sync {
    async fn rewrite(&self, text: &str, instruction: &str) -> Result<String, RewriteError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// ChatRewriter
// ---------------------------------------------------------------------------

/// Production [`PromptRewriting`] over a chat-completions endpoint.
pub struct ChatRewriter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl ChatRewriter {
    pub fn new(config: &RewriteConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl PromptRewriting for ChatRewriter {
    async fn rewrite(&self, text: &str, instruction: &str) -> Result<String, RewriteError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: instruction.to_owned(),
                },
                ChatMessage {
                    role: "user",
                    content: text.to_owned(),
                },
            ],
            stream: false,
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RewriteError::Timeout
                } else {
                    RewriteError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RewriteError::Request(format!("HTTP {status}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| RewriteError::Parse(e.to_string()))?;

        let content = body
            .choices
            .and_then(|mut choices| choices.drain(..).next())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|content| content.trim().to_owned())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(RewriteError::EmptyResponse);
        }
        Ok(content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_stream_disabled() {
        let request = ChatRequest {
            model: "glm-4-flash".into(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "Fix punctuation.".into(),
                },
                ChatMessage {
                    role: "user",
                    content: "hello world".into(),
                },
            ],
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "glm-4-flash");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello world");
    }

    #[test]
    fn response_content_path_tolerates_missing_fields() {
        let empty: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.choices.is_none());

        let no_message: ChatResponse = serde_json::from_str(r#"{"choices":[{}]}"#).unwrap();
        assert!(no_message.choices.unwrap()[0].message.is_none());

        let full: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Hello."}}]}"#,
        )
        .unwrap();
        let content = full.choices.unwrap().remove(0).message.unwrap().content;
        assert_eq!(content.as_deref(), Some("Hello."));
    }
}
