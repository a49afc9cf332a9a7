//! Claude Messages API client
//!
//! One non-streaming `POST /v1/messages` per completion. No retry, no
//! backoff; rate limits surface as upstream errors with their status.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use career_assistant_config::CompletionConfig;
use career_assistant_core::{
    ChatMessage, ChatRole, Completion, CompletionProvider, CompletionRequest, TokenUsage,
};

use crate::LlmError;

/// Configuration for the Claude client
#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    /// Temperature (0.0 - 1.0)
    pub temperature: f32,
    /// `None` keeps the HTTP client default
    pub timeout: Option<Duration>,
    /// API endpoint (for testing or proxy)
    pub endpoint: String,
    pub api_version: String,
}

impl ClaudeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        let defaults = CompletionConfig::default();
        Self {
            api_key: api_key.into(),
            model: defaults.model,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            timeout: None,
            endpoint: defaults.endpoint,
            api_version: defaults.api_version,
        }
    }

    /// Build from settings; fails when no key is configured
    pub fn from_settings(settings: &CompletionConfig) -> Result<Self, LlmError> {
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| LlmError::Configuration("completion API key not set".to_string()))?;

        Ok(Self {
            api_key: api_key.to_string(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: settings.timeout_seconds.map(Duration::from_secs),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_version: settings.api_version.clone(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }
}

/// Claude completion client
pub struct ClaudeClient {
    config: ClaudeConfig,
    client: Client,
}

impl ClaudeClient {
    pub fn new(config: ClaudeConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Configuration(
                "completion API key not set".to_string(),
            ));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClaudeConfig {
        &self.config
    }

    fn build_request(&self, request: &CompletionRequest) -> ClaudeRequest {
        ClaudeRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            messages: request.messages.iter().map(ClaudeMessage::from).collect(),
            system: Some(request.system.clone()).filter(|s| !s.is_empty()),
            temperature: Some(self.config.temperature),
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            let ms = self
                .config
                .timeout
                .map(|t| t.as_millis() as u64)
                .unwrap_or_default();
            LlmError::Timeout(ms)
        } else {
            LlmError::Network(err.to_string())
        }
    }

    async fn send(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let body = self.build_request(request);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.endpoint))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let response: ClaudeApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(response.into_completion())
    }
}

#[async_trait]
impl CompletionProvider for ClaudeClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> career_assistant_core::Result<Completion> {
        let started = std::time::Instant::now();
        let result = self.send(&request).await;

        match &result {
            Ok(completion) => tracing::debug!(
                model = %self.config.model,
                input_tokens = completion.usage.input_tokens,
                output_tokens = completion.usage.output_tokens,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Completion received"
            ),
            Err(e) => tracing::warn!(
                model = %self.config.model,
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Completion failed"
            ),
        }

        result.map_err(Into::into)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// =============================================================================
// Claude API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: &'static str,
    content: String,
}

impl From<&ChatMessage> for ClaudeMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: match message.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            },
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ClaudeApiResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    content: Vec<ClaudeContentBlock>,
    #[serde(default)]
    usage: ClaudeUsage,
}

#[derive(Debug, Default, Deserialize)]
struct ClaudeUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl ClaudeApiResponse {
    fn into_completion(self) -> Completion {
        let text = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                ClaudeContentBlock::Text { text } => Some(text),
                ClaudeContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Completion {
            id: self.id,
            text,
            usage: TokenUsage {
                input_tokens: self.usage.input_tokens,
                output_tokens: self.usage.output_tokens,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ClaudeClient {
        ClaudeClient::new(ClaudeConfig::new("test-key")).unwrap()
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            ClaudeClient::new(ClaudeConfig::new("")),
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_settings_requires_key() {
        let settings = CompletionConfig {
            api_key: None,
            ..Default::default()
        };
        assert!(ClaudeConfig::from_settings(&settings).is_err());

        let settings = CompletionConfig {
            api_key: Some("sk-test".to_string()),
            endpoint: "http://localhost:9999/".to_string(),
            timeout_seconds: Some(5),
            ..Default::default()
        };
        let config = ClaudeConfig::from_settings(&settings).unwrap();
        assert_eq!(config.endpoint, "http://localhost:9999");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.model, "claude-3-haiku-20240307");
    }

    #[test]
    fn test_request_serialization() {
        let request = CompletionRequest::new("You are helpful")
            .with_messages([ChatMessage::user("Hello"), ChatMessage::assistant("Hi")]);
        let json = serde_json::to_value(client().build_request(&request)).unwrap();

        assert_eq!(json["model"], "claude-3-haiku-20240307");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["system"], "You are helpful");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Hi");
    }

    #[test]
    fn test_empty_system_omitted() {
        let request = CompletionRequest::new("").with_messages([ChatMessage::user("Hello")]);
        let json = serde_json::to_value(client().build_request(&request)).unwrap();
        assert!(json.get("system").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "id": "msg_01",
            "type": "message",
            "content": [
                {"type": "text", "text": "Hello "},
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"type": "text", "text": "there"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 12, "output_tokens": 3}
        }"#;
        let response: ClaudeApiResponse = serde_json::from_str(raw).unwrap();
        let completion = response.into_completion();

        assert_eq!(completion.id, "msg_01");
        assert_eq!(completion.text, "Hello there");
        assert_eq!(completion.usage.input_tokens, 12);
        assert_eq!(completion.usage.output_tokens, 3);
    }

    #[test]
    fn test_empty_content_yields_empty_text() {
        let response: ClaudeApiResponse =
            serde_json::from_str(r#"{"id":"msg_02","content":[]}"#).unwrap();
        assert!(response.into_completion().text.is_empty());
    }

    #[test]
    fn test_error_conversion_keeps_status() {
        let err: career_assistant_core::Error = LlmError::Api {
            status: 429,
            message: "rate limited".to_string(),
        }
        .into();
        assert_eq!(err.upstream_status(), Some(429));
    }
}
