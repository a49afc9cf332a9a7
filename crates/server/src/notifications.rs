//! Notification endpoints: contact form, live chat relay, direct message

use axum::{body::Bytes, extract::State, Json};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use career_assistant_config::constants::errors;
use career_assistant_core::{
    ChatRelayRequest, ContactRequest, DirectMessageRequest, NotificationMessage,
};
use career_assistant_notify::{contact_message, direct_message, live_chat_message, MessageContext};

use crate::state::AppState;
use crate::{metrics, ServerError};

fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, ServerError> {
    serde_json::from_slice(body).map_err(|_| ServerError::BadRequest(errors::INVALID_BODY))
}

fn present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Deliver one message; missing webhook and delivery failures become 500s
async fn deliver(
    state: &AppState,
    kind: &'static str,
    message: NotificationMessage,
) -> Result<(), ServerError> {
    let Some(channel) = state.notification_channel() else {
        tracing::error!(kind, "Notification webhook is not configured");
        return Err(ServerError::Internal(errors::SERVER_CONFIGURATION));
    };

    let result = state.sink.send(&channel, &message).await;
    metrics::record_notification(kind, result.is_ok());

    result.map_err(|e| {
        tracing::error!(kind, error = %e, "Failed to deliver notification");
        ServerError::Internal(errors::SEND_FAILED)
    })
}

fn context(state: &AppState) -> MessageContext {
    MessageContext::now(&state.settings.notifications.site_name)
}

/// `POST /api/contact`
pub async fn contact(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ServerError> {
    let request: ContactRequest = parse(&body)?;
    if !(present(&request.name) && present(&request.email) && present(&request.message)) {
        return Err(ServerError::BadRequest(errors::MISSING_FIELDS));
    }

    deliver(&state, "contact", contact_message(&request, &context(&state))).await?;
    tracing::info!(name = %request.name, "Contact form relayed");
    Ok(Json(json!({ "success": true })))
}

/// `POST /api/chat`
pub async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ServerError> {
    let request: ChatRelayRequest = parse(&body)?;
    if !(present(&request.message) && present(&request.user_name)) {
        return Err(ServerError::BadRequest(errors::MISSING_FIELDS));
    }

    deliver(&state, "chat", live_chat_message(&request, &context(&state))).await?;
    tracing::info!(
        user = %request.user_name,
        handoff = request.is_interview_handoff,
        "Chat message relayed"
    );

    let now = Utc::now();
    Ok(Json(json!({
        "success": true,
        "messageId": now.timestamp_millis().to_string(),
        "timestamp": now.to_rfc3339(),
    })))
}

/// `POST /api/slack-dm`
pub async fn slack_dm(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ServerError> {
    let request: DirectMessageRequest = parse(&body)?;
    if !(present(&request.name) && present(&request.message)) {
        return Err(ServerError::BadRequest(errors::MISSING_FIELDS));
    }

    deliver(&state, "slack_dm", direct_message(&request, &context(&state))).await?;
    Ok(Json(json!({ "success": true })))
}
