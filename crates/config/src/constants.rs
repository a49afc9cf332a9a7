//! Fixed strings and thresholds shared by the server and the session

/// Sentinel messages understood by the completion endpoint
pub mod sentinels {
    /// Ask for a greeting instead of a completion
    pub const WELCOME_MESSAGE: &str = "__WELCOME_MESSAGE__";

    /// Older widgets send this instead of [`WELCOME_MESSAGE`]
    pub const WELCOME_RECRUITING: &str = "__WELCOME_RECRUITING__";

    /// Ask for the visitor classification only
    pub const GET_VISITOR_INFO: &str = "__GET_VISITOR_INFO__";

    pub fn is_welcome(message: &str) -> bool {
        message == WELCOME_MESSAGE || message == WELCOME_RECRUITING
    }
}

/// Visitor scoring
pub mod classification {
    /// Minimum score for `is_likely_recruiter`
    pub const RECRUITER_THRESHOLD: i32 = 30;
}

/// Interview qualification
pub mod interview {
    pub const MIN_USER_TURNS: usize = 3;
    pub const MIN_SCORE: u32 = 5;
    pub const TRANSITION_DELAY_MS: u64 = 2000;

    /// Characters of joined user responses included in a hand-off
    pub const HANDOFF_EXPERIENCE_CHARS: usize = 200;
}

/// Canned texts
pub mod messages {
    pub const RECRUITER_GREETING: &str = "👋 Hi there! It looks like you might be exploring talent. \
        I'm an AI assistant that knows this candidate's background in depth: experience, skills, \
        leadership and current projects. Ask me anything, or tell me about the role you're hiring for.";

    pub const GENERAL_GREETING: &str = "Hi! I'm an AI career assistant. I can answer questions about \
        professional experience, technical skills, projects and availability. What would you like to know?";

    /// Shown by the session when the welcome call fails
    pub const WELCOME_FALLBACK: &str = "👋 Hi! I'm an AI recruiting assistant. I'll conduct a brief \
        interview to understand your background and needs. Based on our conversation, I may connect \
        you directly for an immediate discussion. Ready to start?";

    /// System turn appended when a completion call fails
    pub const RETRY_NOTICE: &str =
        "Sorry, I'm having trouble connecting right now. Please try again in a moment.";

    /// Substitute for an empty completion
    pub const EMPTY_COMPLETION: &str = "I'm not sure how to respond to that.";
}

/// Error bodies returned by the HTTP endpoints
pub mod errors {
    pub const METHOD_NOT_ALLOWED: &str = "Method Not Allowed";
    pub const INVALID_BODY: &str = "Invalid request body";
    pub const MESSAGE_REQUIRED: &str = "Message is required";
    pub const SERVICE_UNAVAILABLE: &str = "AI service temporarily unavailable";
    pub const ASSISTANT_UNAVAILABLE: &str =
        "AI assistant temporarily unavailable. Please try again later.";
    pub const MISSING_FIELDS: &str = "Missing required fields";
    pub const SERVER_CONFIGURATION: &str = "Server configuration error";
    pub const SEND_FAILED: &str = "Failed to send message";

    pub fn upstream(status: u16) -> String {
        format!("AI service error: {}", status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_aliases() {
        assert!(sentinels::is_welcome("__WELCOME_MESSAGE__"));
        assert!(sentinels::is_welcome("__WELCOME_RECRUITING__"));
        assert!(!sentinels::is_welcome("__GET_VISITOR_INFO__"));
        assert!(!sentinels::is_welcome("hello"));
    }

    #[test]
    fn test_greetings_differ() {
        assert_ne!(messages::RECRUITER_GREETING, messages::GENERAL_GREETING);
    }

    #[test]
    fn test_upstream_error_text() {
        assert_eq!(errors::upstream(429), "AI service error: 429");
    }
}
