//! Team-chat notification capability

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Destination of a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    /// Short label used in logs
    pub name: String,
    pub webhook_url: String,
}

impl NotificationChannel {
    pub fn new(name: impl Into<String>, webhook_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            webhook_url: webhook_url.into(),
        }
    }
}

/// Pre-formatted message: plain fallback text plus rich layout blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<serde_json::Value>,
}

impl NotificationMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            blocks: Vec::new(),
        }
    }
}

/// Best-effort delivery: one attempt, no retry, no queue.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    async fn send(&self, channel: &NotificationChannel, message: &NotificationMessage)
        -> Result<()>;
}
