//! Language-model client
//!
//! A single-method capability trait over chat-completion providers, with
//! an OpenAI-compatible HTTP implementation. One prompt in, one completion
//! out; no conversation state.

use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Trait for language-model completion
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Produce a completion for a prompt
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// OpenAI-compatible chat completions client
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl ChatClient {
    /// Create a new client from configuration.
    ///
    /// A missing API key is a startup failure.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| AppError::Configuration {
            message: "Language-model provider requires an API key".to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl LanguageModel for ChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "You are a helpful research assistant.".to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::llm(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::llm(format!("API error {}: {}", status, body)));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::llm(format!("Failed to parse response: {}", e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::llm("Empty response"))
    }
}

/// Canned language model for tests: returns a fixed completion, or fails
/// when constructed as unavailable.
pub struct StaticLanguageModel {
    response: Option<String>,
}

impl StaticLanguageModel {
    pub fn responding(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
        }
    }

    pub fn unavailable() -> Self {
        Self { response: None }
    }
}

#[async_trait]
impl LanguageModel for StaticLanguageModel {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.response
            .clone()
            .ok_or_else(|| AppError::llm("connection refused"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_client_requires_api_key() {
        let config = LlmConfig {
            endpoint: "https://api.openai.com/v1/chat/completions".into(),
            api_key: None,
            model: "gpt-4o-mini".into(),
            temperature: 0.1,
            timeout_secs: 10,
        };
        assert!(ChatClient::new(&config).is_err());
    }

    #[test]
    fn test_static_model() {
        let model = StaticLanguageModel::responding("An answer.");
        assert_eq!(
            tokio_test::block_on(model.complete("prompt")).unwrap(),
            "An answer."
        );

        let down = StaticLanguageModel::unavailable();
        assert!(matches!(
            tokio_test::block_on(down.complete("prompt")).unwrap_err(),
            AppError::ServiceUnavailable { .. }
        ));
    }
}
