//! Conversation turns and interview bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a turn in the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// Greeting or retry notices produced by the session itself
    System,
    User,
    Assistant,
    /// Interview summary offering the switch to a live conversation
    Transition,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::System => "system",
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
            TurnRole::Transition => "transition",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a user turn was entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputOrigin {
    #[default]
    Typed,
    Voice,
}

/// Snapshot of the candidate attached to a transition turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    pub name: Option<String>,
    /// All user responses joined by a space
    pub experience: String,
    pub response_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnMetadata {
    pub interview_score: u32,
    pub qualified: bool,
    pub candidate_profile: CandidateProfile,
}

/// A single entry of the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub id: Uuid,
    pub role: TurnRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub origin: InputOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TurnMetadata>,
}

impl ConversationTurn {
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            created_at: Utc::now(),
            origin: InputOrigin::Typed,
            metadata: None,
        }
    }

    pub fn user(text: impl Into<String>, origin: InputOrigin) -> Self {
        Self {
            origin,
            ..Self::new(TurnRole::User, text)
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(TurnRole::System, text)
    }

    pub fn transition(text: impl Into<String>, metadata: TurnMetadata) -> Self {
        Self::new(TurnRole::Transition, text).with_metadata(metadata)
    }

    pub fn with_metadata(mut self, metadata: TurnMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn is_voice(&self) -> bool {
        self.origin == InputOrigin::Voice
    }
}

/// Interview state derived from the transcript
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewProgress {
    pub collected_user_responses: Vec<String>,
    pub cumulative_score: u32,
    pub qualified: bool,
    pub extracted_name: Option<String>,
}

impl InterviewProgress {
    pub fn user_turn_count(&self) -> usize {
        self.collected_user_responses.len()
    }

    /// User responses joined by a single space
    pub fn experience(&self) -> String {
        self.collected_user_responses.join(" ")
    }

    pub fn candidate_profile(&self) -> CandidateProfile {
        CandidateProfile {
            name: self.extracted_name.clone(),
            experience: self.experience(),
            response_count: self.user_turn_count(),
        }
    }
}

/// Contact details and transcript handed to a human after qualification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateHandoff {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub progress: InterviewProgress,
    pub transcript_snapshot: Vec<ConversationTurn>,
}
