//! Language model abstraction
//!
//! Both the intent classifier and the document chatbot talk to the model
//! through [`LanguageModel`]. Production uses the Anthropic Messages API;
//! tests use [`MockModel`] with scripted replies.

use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Trait for single-turn text completion
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `user` under the `system` instructions, returning the reply text
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Build the configured backend, `None` when no API key is available
pub fn from_config(config: &LlmConfig) -> Result<Option<Arc<dyn LanguageModel>>> {
    match config.api_key.as_deref() {
        Some(key) => {
            let model = AnthropicModel::new(
                key.to_string(),
                config.model.clone(),
                config.base_url.clone(),
                config.max_tokens,
                config.timeout(),
            )?;
            Ok(Some(Arc::new(model)))
        }
        None => Ok(None),
    }
}

/// Anthropic Messages API client
pub struct AnthropicModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    timeout: Duration,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [RequestMessage<'a>; 1],
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl AnthropicModel {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tokens,
            timeout,
        })
    }
}

#[async_trait]
impl LanguageModel for AnthropicModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url);

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages: [RequestMessage {
                role: "user",
                content: user,
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::ModelTimeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    AppError::ModelError {
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ModelError {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: MessagesResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::MalformedModelReply {
                    message: format!("Failed to parse response: {}", e),
                })?;

        let text: String = result
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect();

        if text.trim().is_empty() {
            return Err(AppError::MalformedModelReply {
                message: "Empty completion".to_string(),
            });
        }

        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Mock model for testing
///
/// Replies are served in order; once exhausted every call fails.
pub struct MockModel {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Mock that answers every scripted call with the given texts
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue an error reply
    pub async fn push_error(&self, error: AppError) {
        self.replies.lock().await.push_back(Err(error));
    }

    pub async fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().await.push_back(Ok(reply.into()));
    }

    /// `(system, user)` pairs received so far
    pub async fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().await.clone()
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.prompts
            .lock()
            .await
            .push((system.to_string(), user.to_string()));

        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(AppError::ModelUnavailable))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_serves_replies_in_order() {
        let model = MockModel::with_replies(["uno", "dos"]);
        assert_eq!(model.complete("s", "a").await.unwrap(), "uno");
        assert_eq!(model.complete("s", "b").await.unwrap(), "dos");
        assert!(matches!(
            model.complete("s", "c").await,
            Err(AppError::ModelUnavailable)
        ));
        assert_eq!(model.prompts().await.len(), 3);
    }

    #[test]
    fn test_mock_scripted_error() {
        let model = MockModel::new();
        let result = tokio_test::block_on(async {
            model.push_error(AppError::ModelTimeout { timeout_ms: 10 }).await;
            model.complete("s", "u").await
        });
        assert!(matches!(result, Err(AppError::ModelTimeout { .. })));
    }

    #[test]
    fn test_from_config_without_key() {
        let config = LlmConfig::default();
        assert!(from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_from_config_with_key() {
        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "https://api.anthropic.com/".to_string(),
            ..LlmConfig::default()
        };
        let model = from_config(&config).unwrap().unwrap();
        assert_eq!(model.model_name(), "claude-sonnet-4-5");
    }

    #[test]
    fn test_response_text_blocks() {
        let raw = r#"{"content":[{"type":"text","text":"{\"a\":"},{"type":"text","text":"1}"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed.content.into_iter().map(|b| b.text).collect();
        assert_eq!(text, "{\"a\":1}");
    }
}
