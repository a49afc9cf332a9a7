//! Visitor-facing agent logic
//!
//! - Recruiter classification from visitor signals
//! - Interview scoring and hand-off composition
//! - Conversation session state machine with voice I/O
//! - HTTP gateway used by the session to reach the server

pub mod gateway;
pub mod interview;
pub mod recruiter;
pub mod session;

pub use gateway::HttpAssistantGateway;
pub use interview::{handoff_message, transition_turn, InterviewEvaluator};
pub use recruiter::{classify, RecruiterClassifier};
pub use session::{
    ContactForm, ConversationSession, HandoffState, IgnoreReason, ListenState, NetworkState,
    SessionConfig, SessionEvent, SpeechState, SubmitOutcome,
};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid contact details: {0}")]
    InvalidContact(String),

    #[error("Hand-off has not been offered")]
    HandoffNotOffered,

    #[error("Voice input is not available")]
    VoiceUnavailable,

    #[error("Speech error: {0}")]
    Speech(career_assistant_core::Error),

    #[error("Gateway error: {0}")]
    Gateway(career_assistant_core::Error),

    #[error("Session is closed")]
    Closed,
}
