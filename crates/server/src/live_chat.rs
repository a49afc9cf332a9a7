//! Live-chat relay
//!
//! Visitors connect over a WebSocket; their messages go to the notification
//! sink. Operator replies arrive over HTTP and are broadcast to every
//! connected visitor. Delivery is best-effort: lagging sockets skip messages.

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use career_assistant_config::constants::errors;
use career_assistant_core::ChatRelayRequest;
use career_assistant_notify::{live_chat_message, MessageContext};

use crate::state::AppState;
use crate::ServerError;

/// Header carrying the operator secret on reply requests
pub const OPERATOR_TOKEN_HEADER: &str = "x-operator-token";

/// Reply from the site owner, fanned out to every visitor socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorMessage {
    pub id: String,
    pub text: String,
    pub sender: String,
    pub sender_name: String,
    pub timestamp: DateTime<Utc>,
}

/// Frames sent by the visitor widget
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VisitorFrame {
    #[serde(rename_all = "camelCase")]
    ChatMessage {
        #[serde(default)]
        id: Option<String>,
        text: String,
        #[serde(default)]
        user_name: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    TypingStart {
        #[serde(default)]
        user_name: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    TypingStop {
        #[serde(default)]
        user_name: Option<String>,
    },
    Ping,
}

/// Frames sent to the visitor widget
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    #[serde(rename_all = "camelCase")]
    Connection {
        status: &'static str,
        connection_id: String,
        operator_online: bool,
    },
    #[serde(rename_all = "camelCase")]
    MessageReceived { message_id: String },
    OperatorMessage(OperatorMessage),
    Pong,
    Error { message: String },
}

impl ServerFrame {
    fn to_message(&self) -> Option<Message> {
        serde_json::to_string(self).ok().map(Message::Text)
    }
}

/// Connected sockets and the operator broadcast channel
pub struct LiveChatHub {
    tx: broadcast::Sender<OperatorMessage>,
    connections: DashMap<String, DateTime<Utc>>,
    operator_online: bool,
}

impl LiveChatHub {
    pub fn new(capacity: usize, operator_online: bool) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            connections: DashMap::new(),
            operator_online,
        }
    }

    pub fn operator_online(&self) -> bool {
        self.operator_online
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OperatorMessage> {
        self.tx.subscribe()
    }

    /// Returns the number of sockets the message was queued for
    pub fn broadcast(&self, message: OperatorMessage) -> usize {
        self.tx.send(message).unwrap_or(0)
    }

    pub fn register(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.connections.insert(id.clone(), Utc::now());
        id
    }

    pub fn unregister(&self, connection_id: &str) {
        self.connections.remove(connection_id);
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

/// `GET /ws/live-chat`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    if !state.settings.live_chat.enabled {
        return ServerError::Unavailable("Live chat is disabled").into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = state.live_chat.register();
    let (mut sender, mut receiver) = socket.split();
    let mut operator_rx = state.live_chat.subscribe();

    tracing::info!(
        connection_id = %connection_id,
        connections = state.live_chat.connection_count(),
        "Live chat visitor connected"
    );

    let hello = ServerFrame::Connection {
        status: "connected",
        connection_id: connection_id.clone(),
        operator_online: state.live_chat.operator_online(),
    };
    if let Some(msg) = hello.to_message() {
        if sender.send(msg).await.is_err() {
            state.live_chat.unregister(&connection_id);
            return;
        }
    }

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = handle_frame(&state, &connection_id, &text).await {
                        if let Some(msg) = reply.to_message() {
                            if sender.send(msg).await.is_err() {
                                break;
                            }
                        }
                    }
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {},
                Some(Err(e)) => {
                    tracing::debug!(connection_id = %connection_id, error = %e, "Socket error");
                    break;
                },
            },
            outgoing = operator_rx.recv() => match outgoing {
                Ok(message) => {
                    if let Some(msg) = ServerFrame::OperatorMessage(message).to_message() {
                        if sender.send(msg).await.is_err() {
                            break;
                        }
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(connection_id = %connection_id, skipped, "Visitor socket lagging");
                },
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    state.live_chat.unregister(&connection_id);
    tracing::info!(connection_id = %connection_id, "Live chat visitor disconnected");
}

/// Process one visitor frame and return the reply, if any
pub async fn handle_frame(state: &AppState, connection_id: &str, raw: &str) -> Option<ServerFrame> {
    let frame = match serde_json::from_str::<VisitorFrame>(raw) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(connection_id, error = %e, "Unrecognized live chat frame");
            return Some(ServerFrame::Error {
                message: errors::INVALID_BODY.to_string(),
            });
        },
    };

    match frame {
        VisitorFrame::ChatMessage { id, text, user_name } => {
            let request = ChatRelayRequest {
                message: text,
                user_name: user_name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| "Anonymous".to_string()),
                timestamp: Some(Utc::now()),
                is_interview_handoff: false,
            };

            match state.notification_channel() {
                Some(channel) => {
                    let ctx = MessageContext::now(&state.settings.notifications.site_name);
                    let delivered = state
                        .sink
                        .send(&channel, &live_chat_message(&request, &ctx))
                        .await
                        .map_err(|e| {
                            tracing::warn!(connection_id, error = %e, "Live chat relay failed")
                        })
                        .is_ok();
                    crate::metrics::record_notification("live_chat", delivered);
                },
                None => tracing::warn!(connection_id, "No notification channel for live chat"),
            }

            Some(ServerFrame::MessageReceived {
                message_id: id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            })
        },
        VisitorFrame::TypingStart { user_name } => {
            tracing::debug!(connection_id, user = ?user_name, "Visitor typing");
            None
        },
        VisitorFrame::TypingStop { .. } => None,
        VisitorFrame::Ping => Some(ServerFrame::Pong),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperatorReply {
    #[serde(default)]
    text: String,
    #[serde(default)]
    sender_name: Option<String>,
}

/// `POST /api/live-chat/reply`
pub async fn operator_reply(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ServerError> {
    let expected = state
        .settings
        .live_chat
        .operator_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or(ServerError::Unavailable("Live chat operator is not configured"))?;

    let provided = headers
        .get(OPERATOR_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if provided != expected {
        return Err(ServerError::Unauthorized);
    }

    let reply: OperatorReply =
        serde_json::from_slice(&body).map_err(|_| ServerError::BadRequest(errors::INVALID_BODY))?;
    if reply.text.trim().is_empty() {
        return Err(ServerError::BadRequest(errors::MISSING_FIELDS));
    }

    let message = OperatorMessage {
        id: uuid::Uuid::new_v4().to_string(),
        text: reply.text,
        sender: "operator".to_string(),
        sender_name: reply
            .sender_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Operator".to_string()),
        timestamp: Utc::now(),
    };
    let id = message.id.clone();
    let delivered = state.live_chat.broadcast(message);
    tracing::info!(message_id = %id, delivered, "Operator reply broadcast");

    Ok(Json(serde_json::json!({
        "success": true,
        "messageId": id,
        "delivered": delivered,
    })))
}
