//! Core types and capability traits for the career assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Visitor signals and classification results
//! - Conversation turns and interview progress
//! - Wire bodies shared by the widget client and the server
//! - Capability traits for external services
//! - Error types

pub mod api;
pub mod conversation;
pub mod error;
pub mod signals;
pub mod traits;

pub use api::{
    AssistantReply, AssistantRequest, ChatMessage, ChatRelayRequest, ChatRole, ContactRequest,
    DirectMessageRequest, TokenUsage,
};
pub use conversation::{
    CandidateHandoff, CandidateProfile, ConversationTurn, InputOrigin, InterviewProgress,
    TurnMetadata, TurnRole,
};
pub use error::{Error, Result};
pub use signals::{BrowserTelemetry, ClassificationResult, GeoInfo, VisitorSignals};

pub use traits::{
    AssistantGateway, Completion, CompletionProvider, CompletionRequest, GeoLookupProvider,
    NotificationChannel, NotificationMessage, NotificationSink, SpeechRecognizer,
    SpeechSynthesizer, VoiceSettings,
};
