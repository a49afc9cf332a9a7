//! Notification Relay
//!
//! Formats contact, chat and direct messages as Slack Block Kit payloads
//! and delivers them to an incoming webhook. Delivery is a single attempt.

pub mod format;
pub mod slack;

pub use format::{
    contact_message, direct_message, live_chat_message, ChatMessageKind, MessageContext,
};
pub use slack::SlackWebhookSink;
