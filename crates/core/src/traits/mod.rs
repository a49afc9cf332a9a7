//! Capability traits
//!
//! Every external dependency sits behind one of these so classification,
//! session and relay logic can run against deterministic fakes.
//!
//! ```text
//! Completion:    CompletionProvider  (external chat-completion API)
//! Enrichment:    GeoLookupProvider   (IP to organization lookup)
//! Notification:  NotificationSink    (team-chat incoming webhook)
//! Client side:   AssistantGateway    (completion + relay endpoints)
//! Voice:         SpeechRecognizer, SpeechSynthesizer
//! ```

mod completion;
mod gateway;
mod geo;
mod notification;
mod speech;

pub use completion::{Completion, CompletionProvider, CompletionRequest};
pub use gateway::AssistantGateway;
pub use geo::GeoLookupProvider;
pub use notification::{NotificationChannel, NotificationMessage, NotificationSink};
pub use speech::{SpeechRecognizer, SpeechSynthesizer, VoiceSettings};
