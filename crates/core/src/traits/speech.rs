//! Speech input/output capabilities
//!
//! Both are fire-and-start: results come back to the session as events
//! (`on_transcript`, `on_speech_finished`) rather than return values.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Voice parameters for synthesis and recognition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub language: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            rate: 1.1,
            pitch: 1.0,
            volume: 0.8,
        }
    }
}

/// Speech-to-text capture
pub trait SpeechRecognizer: Send + Sync + 'static {
    /// Begin a single, non-continuous capture
    fn start(&self, language: &str) -> Result<()>;

    /// Stop any capture in progress; no-op when idle
    fn abort(&self);
}

/// Text-to-speech output
pub trait SpeechSynthesizer: Send + Sync + 'static {
    /// Start speaking `text`
    fn speak(&self, text: &str, voice: &VoiceSettings) -> Result<()>;

    /// Stop any utterance in progress; no-op when silent
    fn cancel(&self);
}
