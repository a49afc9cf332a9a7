//! Application State
//!
//! Shared, immutable state across all handlers. Requests never mutate it;
//! only the live-chat hub tracks connections.

use std::sync::Arc;
use std::time::Duration;

use career_assistant_agent::RecruiterClassifier;
use career_assistant_config::{Biography, Settings};
use career_assistant_core::{
    CompletionProvider, GeoLookupProvider, NotificationChannel, NotificationSink,
};
use career_assistant_llm::{ClaudeClient, ClaudeConfig, PromptComposer};
use career_assistant_notify::SlackWebhookSink;

use crate::geo::IpApiLookup;
use crate::live_chat::LiveChatHub;
use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    /// `None` when no API key is configured
    pub completion: Option<Arc<dyn CompletionProvider>>,
    /// `None` when lookups are disabled
    pub geo: Option<Arc<dyn GeoLookupProvider>>,
    pub sink: Arc<dyn NotificationSink>,
    pub classifier: Arc<RecruiterClassifier>,
    pub composer: Arc<PromptComposer>,
    pub live_chat: Arc<LiveChatHub>,
}

impl AppState {
    /// Build state with the production providers
    pub fn new(settings: Settings, biography: Biography) -> Result<Self, ServerError> {
        let completion: Option<Arc<dyn CompletionProvider>> =
            match ClaudeConfig::from_settings(&settings.completion) {
                Ok(config) => {
                    let client =
                        ClaudeClient::new(config).map_err(|e| ServerError::Startup(e.to_string()))?;
                    Some(Arc::new(client))
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Completion provider disabled");
                    None
                },
            };

        let geo: Option<Arc<dyn GeoLookupProvider>> = if settings.geo.enabled {
            let lookup =
                IpApiLookup::new(&settings.geo).map_err(|e| ServerError::Startup(e.to_string()))?;
            Some(Arc::new(lookup))
        } else {
            None
        };

        let sink = SlackWebhookSink::from_settings(&settings.notifications)
            .map_err(|e| ServerError::Startup(e.to_string()))?;

        Ok(Self::with_providers(settings, biography, completion, geo, Arc::new(sink)))
    }

    /// Build state from explicit providers
    pub fn with_providers(
        settings: Settings,
        biography: Biography,
        completion: Option<Arc<dyn CompletionProvider>>,
        geo: Option<Arc<dyn GeoLookupProvider>>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let live_chat = LiveChatHub::new(
            settings.live_chat.channel_capacity,
            settings
                .live_chat
                .operator_token
                .as_deref()
                .is_some_and(|t| !t.is_empty()),
        );

        Self {
            classifier: Arc::new(RecruiterClassifier::new(settings.classifier.clone())),
            composer: Arc::new(PromptComposer::new(biography)),
            live_chat: Arc::new(live_chat),
            settings: Arc::new(settings),
            completion,
            geo,
            sink,
        }
    }

    /// Webhook destination, when one is configured
    pub fn notification_channel(&self) -> Option<NotificationChannel> {
        self.settings
            .notifications
            .slack_webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| NotificationChannel::new("slack", url))
    }

    pub fn geo_timeout(&self) -> Duration {
        Duration::from_millis(self.settings.geo.timeout_ms)
    }
}
