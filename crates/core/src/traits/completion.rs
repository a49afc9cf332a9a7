//! External chat-completion capability

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::{ChatMessage, TokenUsage};
use crate::Result;

/// A single completion call: system prompt plus ordered messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            messages: Vec::new(),
        }
    }

    pub fn with_messages(mut self, messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        self.messages.extend(messages);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Provider-assigned identifier
    pub id: String,
    /// Concatenated text blocks; may be empty
    pub text: String,
    pub usage: TokenUsage,
}

/// Chat-completion backend
///
/// # Example
///
/// ```ignore
/// let provider: Arc<dyn CompletionProvider> = Arc::new(ClaudeClient::new(config)?);
/// let request = CompletionRequest::new(prompt).with_messages(history);
/// let completion = provider.complete(request).await?;
/// ```
#[async_trait]
pub trait CompletionProvider: Send + Sync + 'static {
    /// Issue exactly one completion call
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;

    /// Model identifier, for logging
    fn model_name(&self) -> &str;
}
