//! Block Kit formatters for the notification endpoints

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use career_assistant_core::{
    ChatRelayRequest, ContactRequest, DirectMessageRequest, NotificationMessage,
};

/// Site label and send time stamped into every message footer
#[derive(Debug, Clone)]
pub struct MessageContext {
    pub site_name: String,
    pub sent_at: DateTime<Utc>,
}

impl MessageContext {
    pub fn now(site_name: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            sent_at: Utc::now(),
        }
    }

    fn stamp(&self) -> String {
        self.sent_at.format("%Y-%m-%d %H:%M UTC").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMessageKind {
    Visitor,
    /// Qualified candidate forwarded by the interview flow
    InterviewHandoff,
}

impl ChatMessageKind {
    pub fn of(request: &ChatRelayRequest) -> Self {
        if request.is_interview_handoff {
            ChatMessageKind::InterviewHandoff
        } else {
            ChatMessageKind::Visitor
        }
    }

    fn header(&self) -> &'static str {
        match self {
            ChatMessageKind::Visitor => "💬 Live Chat Message",
            ChatMessageKind::InterviewHandoff => "🔥 Qualified Candidate",
        }
    }
}

fn header(text: &str) -> Value {
    json!({
        "type": "header",
        "text": { "type": "plain_text", "text": text }
    })
}

fn section(text: String) -> Value {
    json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": text }
    })
}

fn fields(pairs: &[(&str, &str)]) -> Value {
    let fields: Vec<Value> = pairs
        .iter()
        .map(|(label, value)| json!({ "type": "mrkdwn", "text": format!("*{}:*\n{}", label, value) }))
        .collect();
    json!({ "type": "section", "fields": fields })
}

fn context(text: String) -> Value {
    json!({
        "type": "context",
        "elements": [{ "type": "mrkdwn", "text": text }]
    })
}

/// `POST /api/contact`
pub fn contact_message(request: &ContactRequest, ctx: &MessageContext) -> NotificationMessage {
    let blocks = vec![
        header("🚀 New Contact Form Message"),
        fields(&[("Name", request.name.as_str()), ("Email", request.email.as_str())]),
        section(format!("*Message:*\n{}", request.message)),
        context(format!("Sent from {} • {}", ctx.site_name, ctx.stamp())),
        json!({
            "type": "actions",
            "elements": [{
                "type": "button",
                "text": { "type": "plain_text", "text": "Reply via Email" },
                "url": format!(
                    "mailto:{}?subject=Re: Your message from {}",
                    request.email, ctx.site_name
                ),
                "style": "primary"
            }]
        }),
    ];

    NotificationMessage {
        text: format!("New contact form message from {}", request.name),
        blocks,
    }
}

/// `POST /api/chat` and live-chat socket messages
pub fn live_chat_message(request: &ChatRelayRequest, ctx: &MessageContext) -> NotificationMessage {
    let kind = ChatMessageKind::of(request);
    let time = request
        .timestamp
        .unwrap_or(ctx.sent_at)
        .format("%H:%M:%S UTC")
        .to_string();

    let quoted = request
        .message
        .lines()
        .map(|line| format!("> {}", line))
        .collect::<Vec<_>>()
        .join("\n");

    let footer = match kind {
        ChatMessageKind::Visitor => format!("🌐 Live from {} • Real-time chat session", ctx.site_name),
        ChatMessageKind::InterviewHandoff => {
            format!("🤖 Interview hand-off from {} • {}", ctx.site_name, ctx.stamp())
        },
    };

    let blocks = vec![
        header(kind.header()),
        fields(&[("Visitor", request.user_name.as_str()), ("Time", time.as_str())]),
        section(format!("*Message:*\n{}", quoted)),
        context(footer),
    ];

    NotificationMessage {
        text: format!("{} from {}", kind.header(), request.user_name),
        blocks,
    }
}

/// `POST /api/slack-dm`
pub fn direct_message(request: &DirectMessageRequest, ctx: &MessageContext) -> NotificationMessage {
    let mut body = format!("*From:* {}", request.name);
    if let Some(email) = request.email.as_deref().filter(|e| !e.trim().is_empty()) {
        body.push_str(&format!(" ({})", email.trim()));
    }
    body.push_str(&format!("\n*Message:* {}", request.message));

    NotificationMessage {
        text: format!("New direct message from {}", request.name),
        blocks: vec![
            header("💬 New Slack DM"),
            section(body),
            context(format!("Sent from {} • {}", ctx.site_name, ctx.stamp())),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ctx() -> MessageContext {
        MessageContext {
            site_name: "jordan.dev".to_string(),
            sent_at: Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_contact_layout() {
        let request = ContactRequest {
            name: "Sam".into(),
            email: "sam@example.com".into(),
            message: "Hello!".into(),
        };
        let msg = contact_message(&request, &ctx());

        assert_eq!(msg.blocks.len(), 5);
        assert_eq!(msg.blocks[0]["text"]["text"], "🚀 New Contact Form Message");
        assert_eq!(msg.blocks[1]["fields"][1]["text"], "*Email:*\nsam@example.com");
        assert_eq!(msg.blocks[3]["elements"][0]["text"], "Sent from jordan.dev • 2024-03-05 14:30 UTC");
        assert_eq!(
            msg.blocks[4]["elements"][0]["url"],
            "mailto:sam@example.com?subject=Re: Your message from jordan.dev"
        );
    }

    #[test]
    fn test_chat_header_depends_on_kind() {
        let mut request = ChatRelayRequest {
            message: "line one\nline two".into(),
            user_name: "Visitor".into(),
            timestamp: None,
            is_interview_handoff: false,
        };
        let msg = live_chat_message(&request, &ctx());
        assert_eq!(msg.blocks[0]["text"]["text"], "💬 Live Chat Message");
        assert_eq!(msg.blocks[1]["fields"][1]["text"], "*Time:*\n14:30:00 UTC");
        assert_eq!(msg.blocks[2]["text"]["text"], "*Message:*\n> line one\n> line two");

        request.is_interview_handoff = true;
        let msg = live_chat_message(&request, &ctx());
        assert_eq!(msg.blocks[0]["text"]["text"], "🔥 Qualified Candidate");
    }

    #[test]
    fn test_direct_message_optional_email() {
        let mut request = DirectMessageRequest {
            name: "Ana".into(),
            message: "Quick question".into(),
            email: None,
        };
        let msg = direct_message(&request, &ctx());
        assert_eq!(msg.blocks[1]["text"]["text"], "*From:* Ana\n*Message:* Quick question");

        request.email = Some("ana@example.com".into());
        let msg = direct_message(&request, &ctx());
        assert!(msg.blocks[1]["text"]["text"]
            .as_str()
            .unwrap()
            .contains("(ana@example.com)"));
    }
}
