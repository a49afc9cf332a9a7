//! Completion endpoint
//!
//! Stateless per request: collect visitor signals, classify, then either
//! answer a sentinel directly or compose a prompt and call the completion
//! provider with the transcript the client sent.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::time::Instant;

use career_assistant_config::constants::{errors, messages, sentinels};
use career_assistant_core::{
    AssistantRequest, ChatMessage, ChatRole, ClassificationResult, CompletionRequest, Error,
};

use crate::state::AppState;
use crate::{metrics, visitor, ServerError};

/// `POST /api/assistant`
pub async fn handle(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let response = match respond(&state, &headers, &body).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response(),
    };
    metrics::record_request("assistant", response.status().as_u16());
    response
}

async fn respond(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<Value, ServerError> {
    let request: AssistantRequest =
        serde_json::from_slice(body).map_err(|_| ServerError::BadRequest(errors::INVALID_BODY))?;
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ServerError::BadRequest(errors::MESSAGE_REQUIRED));
    }

    let Some(completion) = state.completion.clone() else {
        tracing::error!("Completion API key is not configured");
        return Err(ServerError::Internal(errors::SERVICE_UNAVAILABLE));
    };

    let signals = visitor::collect(
        headers,
        request.browser_data.as_ref(),
        state.geo.as_deref(),
        state.geo_timeout(),
        Utc::now(),
    )
    .await;
    let classification = state.classifier.classify(&signals);
    metrics::record_classification(classification.is_likely_recruiter());

    tracing::info!(
        score = classification.score(),
        recruiter = classification.is_likely_recruiter(),
        tags = ?classification.matched_signal_tags(),
        company = ?classification.company(),
        "Visitor classified"
    );

    if sentinels::is_welcome(message) {
        return Ok(welcome(&classification));
    }
    if message == sentinels::GET_VISITOR_INFO {
        return Ok(json!({ "visitorInfo": classification }));
    }

    let mut conversation = request.history;
    conversation.push(ChatMessage::user(message));
    let completion_request = CompletionRequest::new(state.composer.compose(&classification))
        .with_messages(normalize_history(conversation));

    let started = Instant::now();
    let result = completion.complete(completion_request).await;
    metrics::record_completion_latency(started.elapsed().as_secs_f64());

    match result {
        Ok(reply) => {
            let text = if reply.text.trim().is_empty() {
                messages::EMPTY_COMPLETION.to_string()
            } else {
                reply.text
            };
            Ok(json!({
                "message": text,
                "id": reply.id,
                "usage": reply.usage,
            }))
        },
        Err(Error::Upstream { status, detail }) => {
            tracing::error!(status, detail = %detail, "Completion API error");
            Err(ServerError::Upstream { status })
        },
        Err(e) => {
            tracing::error!(error = %e, "Completion request failed");
            Err(ServerError::Internal(errors::ASSISTANT_UNAVAILABLE))
        },
    }
}

fn welcome(classification: &ClassificationResult) -> Value {
    let greeting = if classification.is_likely_recruiter() {
        messages::RECRUITER_GREETING
    } else {
        messages::GENERAL_GREETING
    };

    json!({
        "message": greeting,
        "id": format!("welcome-{}", uuid::Uuid::new_v4()),
        "usage": null,
        "visitorInfo": classification,
    })
}

/// Make a transcript acceptable to the Messages API: it must open with a
/// user turn and alternate roles. Leading assistant turns are dropped and
/// consecutive same-role turns are merged.
pub fn normalize_history(messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut normalized: Vec<ChatMessage> = Vec::with_capacity(messages.len());

    for message in messages {
        if message.content.trim().is_empty() {
            continue;
        }
        match normalized.last_mut() {
            None if message.role == ChatRole::Assistant => continue,
            Some(last) if last.role == message.role => {
                last.content.push_str("\n\n");
                last.content.push_str(&message.content);
                continue;
            },
            _ => {},
        }
        normalized.push(message);
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_drops_leading_assistant() {
        let out = normalize_history(vec![
            ChatMessage::assistant("Welcome!"),
            ChatMessage::user("Hi"),
        ]);
        assert_eq!(out, vec![ChatMessage::user("Hi")]);
    }

    #[test]
    fn test_normalize_merges_same_role() {
        let out = normalize_history(vec![
            ChatMessage::user("First"),
            ChatMessage::assistant("Reply"),
            ChatMessage::user("Second"),
            ChatMessage::user("Third"),
        ]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].content, "Second\n\nThird");
    }

    #[test]
    fn test_normalize_skips_blank() {
        let out = normalize_history(vec![ChatMessage::user("  "), ChatMessage::user("Hello")]);
        assert_eq!(out, vec![ChatMessage::user("Hello")]);
    }

    #[test]
    fn test_welcome_shape() {
        let classification = ClassificationResult::new(45, 30, Default::default());
        let body = welcome(&classification);
        assert_eq!(body["message"], messages::RECRUITER_GREETING);
        assert!(body["usage"].is_null());
        assert_eq!(body["visitorInfo"]["isLikelyRecruiter"], true);

        let classification = ClassificationResult::new(5, 30, Default::default());
        assert_eq!(welcome(&classification)["message"], messages::GENERAL_GREETING);
    }
}
