//! Conversation Session
//!
//! Client-held state machine for one chat widget:
//!
//! ```text
//! Network:   Initializing → AwaitingInput → AwaitingCompletion → Displaying → AwaitingInput
//! Listening: Idle ⇄ Listening → TranscriptReady → Idle
//! Speech:    Idle ⇄ Speaking
//! Hand-off:  NotQualified → Pending → Offered → Submitting → Submitted
//!                                   ↘ Abandoned (session ended first)
//! ```
//!
//! State lives behind a mutex that is never held across an await, so a
//! second submission made while a completion is outstanding observes
//! `AwaitingCompletion` and is ignored.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

use career_assistant_config::{constants, InterviewConfig, Settings};
use career_assistant_core::{
    AssistantGateway, AssistantRequest, BrowserTelemetry, CandidateHandoff, ChatMessage,
    ChatRelayRequest, ConversationTurn, InputOrigin, InterviewProgress, SpeechRecognizer,
    SpeechSynthesizer, TurnRole, VoiceSettings,
};

use crate::interview::{self, InterviewEvaluator};
use crate::AgentError;

static BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("italic pattern is valid"));
static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(.*?)`").expect("code pattern is valid"));

/// Remove `**bold**`, `*italic*` and `` `code` `` markers before speaking
pub fn strip_markdown(text: &str) -> String {
    let text = BOLD.replace_all(text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    CODE.replace_all(&text, "$1").into_owned()
}

/// Completion request lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    /// Waiting for the welcome greeting
    Initializing,
    AwaitingInput,
    AwaitingCompletion,
    /// Assistant turn being rendered
    Displaying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenState {
    Idle,
    Listening,
    TranscriptReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechState {
    Idle,
    Speaking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffState {
    NotQualified,
    /// Qualified; transition turn due at the given instant
    Pending { due: Instant },
    /// Transition shown, contact form open
    Offered,
    Submitting,
    Submitted,
    Abandoned,
}

/// Why a submission was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Empty,
    /// A completion request is outstanding
    InFlight,
    /// Welcome greeting not loaded yet
    NotReady,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored(IgnoreReason),
    /// Assistant turn appended
    Answered {
        /// The visitor qualified on this turn; call [`ConversationSession::await_transition`]
        qualified: bool,
        spoken: bool,
    },
    /// Request failed; a retry notice was appended
    Failed,
}

/// Session events for UI bindings
#[derive(Debug, Clone)]
pub enum SessionEvent {
    NetworkChanged { old: NetworkState, new: NetworkState },
    TurnAppended(ConversationTurn),
    Qualified { score: u32 },
    HandoffOffered,
    HandoffSubmitted,
    SpeakingStarted { text: String },
    SpeakingFinished,
    ListeningChanged(ListenState),
    Ended,
}

/// Contact details typed into the hand-off form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub company: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.name.trim().is_empty() {
            return Err(AgentError::InvalidContact("name is required".to_string()));
        }
        if !interview::is_plausible_email(&self.email) {
            return Err(AgentError::InvalidContact(
                "a valid email is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub interview: InterviewConfig,
    pub voice: VoiceSettings,
    /// Global switch for speaking assistant turns
    pub voice_output_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interview: InterviewConfig::default(),
            voice: VoiceSettings::default(),
            voice_output_enabled: true,
        }
    }
}

impl SessionConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            interview: settings.interview.clone(),
            ..Default::default()
        }
    }

    fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.interview.transition_delay_ms)
    }
}

struct SessionInner {
    turns: Vec<ConversationTurn>,
    network: NetworkState,
    listen: ListenState,
    speech: SpeechState,
    handoff: HandoffState,
    progress: InterviewProgress,
    transition_emitted: bool,
    voice_output_enabled: bool,
    contact: ContactForm,
    closed: bool,
}

/// One visitor's chat session
pub struct ConversationSession {
    id: String,
    config: SessionConfig,
    evaluator: InterviewEvaluator,
    gateway: Arc<dyn AssistantGateway>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    browser: BrowserTelemetry,
    started_at: Instant,
    inner: Mutex<SessionInner>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl ConversationSession {
    pub fn new(config: SessionConfig, gateway: Arc<dyn AssistantGateway>) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let voice_output_enabled = config.voice_output_enabled;

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            evaluator: InterviewEvaluator::new(&config.interview),
            config,
            gateway,
            recognizer: None,
            synthesizer: None,
            browser: BrowserTelemetry::default(),
            started_at: Instant::now(),
            inner: Mutex::new(SessionInner {
                turns: Vec::new(),
                network: NetworkState::Initializing,
                listen: ListenState::Idle,
                speech: SpeechState::Idle,
                handoff: HandoffState::NotQualified,
                progress: InterviewProgress::default(),
                transition_emitted: false,
                voice_output_enabled,
                contact: ContactForm::default(),
                closed: false,
            }),
            event_tx,
        }
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Static browser details (timezone, screen) sent with every request
    pub fn with_browser_profile(mut self, browser: BrowserTelemetry) -> Self {
        self.browser = browser;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn turns(&self) -> Vec<ConversationTurn> {
        self.inner.lock().turns.clone()
    }

    pub fn network_state(&self) -> NetworkState {
        self.inner.lock().network
    }

    pub fn listen_state(&self) -> ListenState {
        self.inner.lock().listen
    }

    pub fn speech_state(&self) -> SpeechState {
        self.inner.lock().speech
    }

    pub fn handoff_state(&self) -> HandoffState {
        self.inner.lock().handoff
    }

    pub fn progress(&self) -> InterviewProgress {
        self.inner.lock().progress.clone()
    }

    pub fn voice_output_enabled(&self) -> bool {
        self.inner.lock().voice_output_enabled
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    fn set_network(&self, inner: &mut SessionInner, new: NetworkState) {
        let old = inner.network;
        inner.network = new;
        if old != new {
            self.emit(SessionEvent::NetworkChanged { old, new });
        }
    }

    fn append(&self, inner: &mut SessionInner, turn: ConversationTurn) {
        inner.turns.push(turn.clone());
        self.emit(SessionEvent::TurnAppended(turn));
    }

    fn telemetry(&self, message_count: usize) -> BrowserTelemetry {
        BrowserTelemetry {
            session_duration: Some(self.started_at.elapsed().as_millis() as u64),
            message_count: Some(message_count as u32),
            ..self.browser.clone()
        }
    }

    /// Load the greeting; falls back to a fixed greeting on any failure
    pub async fn initialize(&self) {
        let request = {
            let inner = self.inner.lock();
            if inner.network != NetworkState::Initializing {
                return;
            }
            AssistantRequest {
                message: constants::sentinels::WELCOME_MESSAGE.to_string(),
                history: Vec::new(),
                browser_data: Some(self.telemetry(0)),
            }
        };

        let greeting = match self.gateway.send_message(&request).await {
            Ok(reply) if !reply.message.trim().is_empty() => reply.message,
            Ok(_) => constants::messages::WELCOME_FALLBACK.to_string(),
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Welcome request failed");
                constants::messages::WELCOME_FALLBACK.to_string()
            },
        };

        let mut inner = self.inner.lock();
        if inner.network == NetworkState::Initializing {
            self.append(&mut inner, ConversationTurn::system(greeting));
            self.set_network(&mut inner, NetworkState::AwaitingInput);
        }
    }

    /// Submit typed text
    pub async fn submit_text(&self, text: &str) -> SubmitOutcome {
        self.submit(text, InputOrigin::Typed).await
    }

    /// Submit a user turn and wait for the assistant
    pub async fn submit(&self, text: &str, origin: InputOrigin) -> SubmitOutcome {
        let text = text.trim();

        let request = {
            let mut inner = self.inner.lock();
            if inner.closed {
                return SubmitOutcome::Ignored(IgnoreReason::Closed);
            }
            if text.is_empty() {
                return SubmitOutcome::Ignored(IgnoreReason::Empty);
            }
            match inner.network {
                NetworkState::Initializing => {
                    return SubmitOutcome::Ignored(IgnoreReason::NotReady)
                },
                NetworkState::AwaitingCompletion => {
                    return SubmitOutcome::Ignored(IgnoreReason::InFlight)
                },
                NetworkState::AwaitingInput | NetworkState::Displaying => {},
            }

            let history = history_of(&inner.turns);
            self.append(&mut inner, ConversationTurn::user(text, origin));
            self.set_network(&mut inner, NetworkState::AwaitingCompletion);

            let user_turns = inner.turns.iter().filter(|t| t.role == TurnRole::User).count();
            AssistantRequest {
                message: text.to_string(),
                history,
                browser_data: Some(self.telemetry(user_turns)),
            }
        };

        let result = self.gateway.send_message(&request).await;

        let mut inner = self.inner.lock();
        match result {
            Ok(reply) => {
                let message = if reply.message.trim().is_empty() {
                    constants::messages::EMPTY_COMPLETION.to_string()
                } else {
                    reply.message
                };
                self.append(&mut inner, ConversationTurn::assistant(message.clone()));
                self.set_network(&mut inner, NetworkState::Displaying);

                let qualified = self.reevaluate(&mut inner);
                let spoken = origin == InputOrigin::Voice
                    && inner.voice_output_enabled
                    && self.speak_locked(&mut inner, &message);

                self.set_network(&mut inner, NetworkState::AwaitingInput);
                SubmitOutcome::Answered { qualified, spoken }
            },
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Completion request failed");
                self.append(
                    &mut inner,
                    ConversationTurn::system(constants::messages::RETRY_NOTICE),
                );
                self.set_network(&mut inner, NetworkState::AwaitingInput);
                SubmitOutcome::Failed
            },
        }
    }

    /// Recompute progress; returns true when the visitor newly qualified
    fn reevaluate(&self, inner: &mut SessionInner) -> bool {
        inner.progress = self.evaluator.evaluate(&inner.turns);

        if inner.progress.qualified
            && !inner.transition_emitted
            && inner.handoff == HandoffState::NotQualified
        {
            inner.handoff = HandoffState::Pending {
                due: Instant::now() + self.config.transition_delay(),
            };
            tracing::info!(
                session_id = %self.id,
                score = inner.progress.cumulative_score,
                responses = inner.progress.user_turn_count(),
                "Visitor qualified for hand-off"
            );
            self.emit(SessionEvent::Qualified {
                score: inner.progress.cumulative_score,
            });
            return true;
        }

        false
    }

    /// Append the transition turn if it is due. At most one per session.
    pub fn poll_transition(&self, now: Instant) -> Option<ConversationTurn> {
        let mut inner = self.inner.lock();

        let due = match inner.handoff {
            HandoffState::Pending { due } => due,
            _ => return None,
        };
        if now < due || inner.transition_emitted || inner.closed {
            return None;
        }

        let turn = interview::transition_turn(&inner.progress);
        inner.transition_emitted = true;
        inner.handoff = HandoffState::Offered;
        self.append(&mut inner, turn.clone());
        self.emit(SessionEvent::HandoffOffered);

        Some(turn)
    }

    /// Wait out the transition delay, then append the transition turn
    pub async fn await_transition(&self) -> Option<ConversationTurn> {
        let due = match self.handoff_state() {
            HandoffState::Pending { due } => due,
            _ => return None,
        };

        tokio::time::sleep_until(tokio::time::Instant::from_std(due)).await;
        self.poll_transition(Instant::now())
    }

    pub fn update_contact(&self, contact: ContactForm) {
        self.inner.lock().contact = contact;
    }

    /// Validate the contact form and forward the transcript to the relay
    pub async fn submit_handoff(&self) -> Result<CandidateHandoff, AgentError> {
        let (handoff, request) = {
            let mut inner = self.inner.lock();
            if inner.closed {
                return Err(AgentError::Closed);
            }
            if inner.handoff != HandoffState::Offered {
                return Err(AgentError::HandoffNotOffered);
            }
            inner.contact.validate()?;

            let handoff = CandidateHandoff {
                name: inner.contact.name.trim().to_string(),
                email: inner.contact.email.trim().to_string(),
                company: Some(inner.contact.company.trim().to_string()).filter(|c| !c.is_empty()),
                progress: inner.progress.clone(),
                transcript_snapshot: inner.turns.clone(),
            };
            let request = ChatRelayRequest {
                message: interview::handoff_message(
                    &handoff,
                    self.config.interview.handoff_experience_chars,
                ),
                user_name: handoff.name.clone(),
                timestamp: Some(chrono::Utc::now()),
                is_interview_handoff: true,
            };

            inner.handoff = HandoffState::Submitting;
            (handoff, request)
        };

        let result = self.gateway.relay_chat(&request).await;

        let mut inner = self.inner.lock();
        match result {
            Ok(()) => {
                inner.handoff = HandoffState::Submitted;
                self.emit(SessionEvent::HandoffSubmitted);
                tracing::info!(session_id = %self.id, "Candidate hand-off submitted");
                Ok(handoff)
            },
            Err(e) => {
                if inner.handoff == HandoffState::Submitting {
                    inner.handoff = HandoffState::Offered;
                }
                tracing::warn!(session_id = %self.id, error = %e, "Hand-off relay failed");
                Err(AgentError::Gateway(e))
            },
        }
    }

    /// Start speech capture; cancels any utterance in progress
    pub fn start_listening(&self) -> Result<(), AgentError> {
        let recognizer = self.recognizer.as_ref().ok_or(AgentError::VoiceUnavailable)?;
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(AgentError::Closed);
        }

        if inner.speech == SpeechState::Speaking {
            if let Some(synth) = &self.synthesizer {
                synth.cancel();
            }
            inner.speech = SpeechState::Idle;
            self.emit(SessionEvent::SpeakingFinished);
        }

        recognizer
            .start(&self.config.voice.language)
            .map_err(AgentError::Speech)?;
        inner.listen = ListenState::Listening;
        self.emit(SessionEvent::ListeningChanged(ListenState::Listening));
        Ok(())
    }

    pub fn stop_listening(&self) {
        let mut inner = self.inner.lock();
        if inner.listen == ListenState::Idle {
            return;
        }
        if let Some(recognizer) = &self.recognizer {
            recognizer.abort();
        }
        inner.listen = ListenState::Idle;
        self.emit(SessionEvent::ListeningChanged(ListenState::Idle));
    }

    /// Recognition failed or ended without a result
    pub fn on_recognition_error(&self, error: &str) {
        tracing::debug!(session_id = %self.id, error, "Speech recognition ended");
        let mut inner = self.inner.lock();
        if inner.listen != ListenState::Idle {
            inner.listen = ListenState::Idle;
            self.emit(SessionEvent::ListeningChanged(ListenState::Idle));
        }
    }

    /// Final transcript from the recognizer; submitted as a voice turn
    pub async fn on_transcript(&self, transcript: &str) -> SubmitOutcome {
        {
            let mut inner = self.inner.lock();
            if inner.listen != ListenState::Listening {
                return SubmitOutcome::Ignored(IgnoreReason::NotReady);
            }
            inner.listen = ListenState::TranscriptReady;
            self.emit(SessionEvent::ListeningChanged(ListenState::TranscriptReady));
            inner.listen = ListenState::Idle;
            self.emit(SessionEvent::ListeningChanged(ListenState::Idle));
        }

        self.submit(transcript, InputOrigin::Voice).await
    }

    /// Synthesizer finished the current utterance
    pub fn on_speech_finished(&self) {
        let mut inner = self.inner.lock();
        if inner.speech == SpeechState::Speaking {
            inner.speech = SpeechState::Idle;
            self.emit(SessionEvent::SpeakingFinished);
        }
    }

    pub fn set_voice_output(&self, enabled: bool) {
        let mut inner = self.inner.lock();
        inner.voice_output_enabled = enabled;

        if !enabled && inner.speech == SpeechState::Speaking {
            if let Some(synth) = &self.synthesizer {
                synth.cancel();
            }
            inner.speech = SpeechState::Idle;
            self.emit(SessionEvent::SpeakingFinished);
        }
    }

    /// Speak `text`; stops recognition and any previous utterance first
    fn speak_locked(&self, inner: &mut SessionInner, text: &str) -> bool {
        let Some(synth) = &self.synthesizer else {
            return false;
        };

        if inner.listen != ListenState::Idle {
            if let Some(recognizer) = &self.recognizer {
                recognizer.abort();
            }
            inner.listen = ListenState::Idle;
            self.emit(SessionEvent::ListeningChanged(ListenState::Idle));
        }

        synth.cancel();
        let clean = strip_markdown(text);
        match synth.speak(&clean, &self.config.voice) {
            Ok(()) => {
                inner.speech = SpeechState::Speaking;
                self.emit(SessionEvent::SpeakingStarted { text: clean });
                true
            },
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Speech synthesis failed");
                inner.speech = SpeechState::Idle;
                false
            },
        }
    }

    /// Close the widget. A pending or offered hand-off is abandoned.
    pub fn end(&self) {
        let mut inner = self.inner.lock();
        if inner.closed {
            return;
        }
        inner.closed = true;

        if matches!(
            inner.handoff,
            HandoffState::Pending { .. } | HandoffState::Offered
        ) {
            inner.handoff = HandoffState::Abandoned;
        }
        if inner.listen != ListenState::Idle {
            if let Some(recognizer) = &self.recognizer {
                recognizer.abort();
            }
            inner.listen = ListenState::Idle;
        }
        if inner.speech == SpeechState::Speaking {
            if let Some(synth) = &self.synthesizer {
                synth.cancel();
            }
            inner.speech = SpeechState::Idle;
        }

        tracing::debug!(session_id = %self.id, turns = inner.turns.len(), "Session ended");
        self.emit(SessionEvent::Ended);
    }
}

/// User and assistant turns in order, as completion context
fn history_of(turns: &[ConversationTurn]) -> Vec<ChatMessage> {
    turns
        .iter()
        .filter_map(|turn| match turn.role {
            TurnRole::User => Some(ChatMessage::user(turn.text.clone())),
            TurnRole::Assistant => Some(ChatMessage::assistant(turn.text.clone())),
            TurnRole::System | TurnRole::Transition => None,
        })
        .collect()
}
