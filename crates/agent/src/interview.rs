//! Hand-off Evaluator
//!
//! Interview progress is a pure fold over the user turns of a transcript.
//! Re-running it on the same transcript always yields the same result.

use once_cell::sync::Lazy;
use regex::Regex;

use career_assistant_config::InterviewConfig;
use career_assistant_core::{
    CandidateHandoff, ConversationTurn, InterviewProgress, TurnMetadata, TurnRole,
};

/// Keyword categories; each keyword present in a user turn scores one point
pub const KEYWORD_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "experience",
        &["years", "experience", "worked", "developed", "built", "led", "managed"],
    ),
    (
        "skills",
        &["javascript", "react", "python", "aws", "api", "database", "typescript", "node"],
    ),
    (
        "seniority",
        &["senior", "lead", "architect", "principal", "manager", "director"],
    ),
    (
        "intent",
        &["hire", "recruit", "opportunity", "position", "role", "job", "career"],
    ),
];

static SELF_INTRODUCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:i'm|my name is|i am|call me)\s+([a-zA-Z\s]+)")
        .expect("self-introduction pattern is valid")
});

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Points for a single user response
pub fn keyword_score(text: &str) -> u32 {
    let lower = text.to_lowercase();
    KEYWORD_CATEGORIES
        .iter()
        .flat_map(|(_, keywords)| keywords.iter())
        .filter(|keyword| lower.contains(*keyword))
        .count() as u32
}

/// Name from a self-introduction such as "I'm Jane" or "call me Sam"
pub fn extract_name(text: &str) -> Option<String> {
    SELF_INTRODUCTION
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

pub fn is_plausible_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}

/// Scores transcripts against the qualification rule
#[derive(Debug, Clone)]
pub struct InterviewEvaluator {
    min_user_turns: usize,
    min_score: u32,
}

impl Default for InterviewEvaluator {
    fn default() -> Self {
        Self::new(&InterviewConfig::default())
    }
}

impl InterviewEvaluator {
    pub fn new(config: &InterviewConfig) -> Self {
        Self {
            min_user_turns: config.min_user_turns,
            min_score: config.min_score,
        }
    }

    /// Recompute progress from the full transcript
    pub fn evaluate(&self, transcript: &[ConversationTurn]) -> InterviewProgress {
        let mut progress = transcript
            .iter()
            .filter(|turn| turn.role == TurnRole::User)
            .fold(InterviewProgress::default(), |mut acc, turn| {
                acc.cumulative_score += keyword_score(&turn.text);
                if acc.extracted_name.is_none() {
                    acc.extracted_name = extract_name(&turn.text);
                }
                acc.collected_user_responses.push(turn.text.clone());
                acc
            });

        progress.qualified = progress.user_turn_count() >= self.min_user_turns
            && progress.cumulative_score >= self.min_score;
        progress
    }
}

/// Evaluate with the default qualification rule
pub fn evaluate(transcript: &[ConversationTurn]) -> InterviewProgress {
    InterviewEvaluator::default().evaluate(transcript)
}

/// Summary turn shown once the visitor qualifies
pub fn transition_turn(progress: &InterviewProgress) -> ConversationTurn {
    let who = match &progress.extracted_name {
        Some(name) => format!("Name: {}", name),
        None => "Qualified candidate".to_string(),
    };

    let text = format!(
        "🎉 Great conversation! Based on our interview, it sounds like there could be a strong fit.\n\n\
         **Interview Summary:**\n\
         • {} thoughtful responses\n\
         • Qualification Score: {}/10\n\
         • {}\n\n\
         Would you like to switch to a live chat for an immediate discussion? \
         Share your name and email below to connect directly.",
        progress.user_turn_count(),
        progress.cumulative_score,
        who
    );

    ConversationTurn::transition(
        text,
        TurnMetadata {
            interview_score: progress.cumulative_score,
            qualified: progress.qualified,
            candidate_profile: progress.candidate_profile(),
        },
    )
}

/// Chat message posted to the relay when a candidate accepts the hand-off
pub fn handoff_message(handoff: &CandidateHandoff, experience_chars: usize) -> String {
    let experience = handoff.progress.experience();
    let mut summary: String = experience.chars().take(experience_chars).collect();
    if experience.chars().count() > experience_chars {
        summary.push_str("...");
    }

    let transcript = handoff
        .transcript_snapshot
        .iter()
        .filter_map(|turn| match turn.role {
            TurnRole::User => Some(format!("👤 Candidate: {}", turn.text)),
            TurnRole::Assistant => Some(format!("🤖 AI: {}", turn.text)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let company = handoff
        .company
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("Not specified");

    format!(
        "🔥 QUALIFIED CANDIDATE READY FOR LIVE CHAT\n\n\
         **Candidate:** {}\n\
         **Email:** {}\n\
         **Company:** {}\n\
         **Qualification Score:** {}/10\n\
         **Responses:** {}\n\n\
         **Experience Summary:**\n{}\n\n\
         **Interview Transcript:**\n{}",
        handoff.name.trim(),
        handoff.email.trim(),
        company,
        handoff.progress.cumulative_score,
        handoff.progress.user_turn_count(),
        summary,
        transcript
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use career_assistant_core::InputOrigin;

    fn user(text: &str) -> ConversationTurn {
        ConversationTurn::user(text, InputOrigin::Typed)
    }

    fn interview(user_texts: &[&str]) -> Vec<ConversationTurn> {
        let mut turns = vec![ConversationTurn::system("welcome")];
        for text in user_texts {
            turns.push(user(text));
            turns.push(ConversationTurn::assistant("Tell me more about that."));
        }
        turns
    }

    #[test]
    fn test_keyword_score() {
        assert_eq!(keyword_score("hello there"), 0);
        assert_eq!(keyword_score("I have EXPERIENCE with React"), 2);
        assert_eq!(keyword_score("javascript"), 1);
    }

    #[test]
    fn test_keyword_counts_once_per_turn() {
        assert_eq!(keyword_score("react react react"), 1);
    }

    #[test]
    fn test_extract_name_variants() {
        assert_eq!(extract_name("I'm Jane, hello").as_deref(), Some("Jane"));
        assert_eq!(extract_name("my name is Sam Lee.").as_deref(), Some("Sam Lee"));
        assert_eq!(extract_name("Call me Al").as_deref(), Some("Al"));
        assert_eq!(extract_name("no introduction here"), None);
    }

    #[test]
    fn test_jane_scenario() {
        let transcript = interview(&[
            "We are looking for someone with experience",
            "Our stack is mostly javascript",
            "I'm Jane, I have 8 years of React and AWS experience and I lead a team",
        ]);
        let progress = evaluate(&transcript);

        assert!(progress.cumulative_score >= 5);
        assert_eq!(progress.extracted_name.as_deref(), Some("Jane"));
        assert!(progress.qualified);
        assert_eq!(progress.user_turn_count(), 3);
    }

    #[test]
    fn test_never_qualifies_below_three_turns() {
        let transcript = interview(&[
            "senior lead architect principal manager director with years of experience",
            "react python aws api database typescript node javascript",
        ]);
        let progress = evaluate(&transcript);
        assert!(progress.cumulative_score >= 5);
        assert!(!progress.qualified);
    }

    #[test]
    fn test_needs_minimum_score() {
        let progress = evaluate(&interview(&["hi", "hello", "thanks"]));
        assert_eq!(progress.cumulative_score, 0);
        assert!(!progress.qualified);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let transcript = interview(&[
            "I'm Alex and I worked on APIs",
            "I built a database",
            "Looking for a senior role",
        ]);
        let first = evaluate(&transcript);
        let second = evaluate(&transcript);
        assert_eq!(first, second);
    }

    #[test]
    fn test_first_name_match_wins() {
        let transcript = interview(&["I am Robin", "my name is Casey", "call me Drew"]);
        assert_eq!(evaluate(&transcript).extracted_name.as_deref(), Some("Robin"));
    }

    #[test]
    fn test_only_user_turns_scored() {
        let transcript = vec![
            ConversationTurn::assistant("senior react aws experience"),
            ConversationTurn::system("lead architect"),
            user("hello"),
        ];
        let progress = evaluate(&transcript);
        assert_eq!(progress.cumulative_score, 0);
        assert_eq!(progress.user_turn_count(), 1);
    }

    #[test]
    fn test_custom_rule() {
        let evaluator = InterviewEvaluator::new(&InterviewConfig {
            min_user_turns: 1,
            min_score: 1,
            ..Default::default()
        });
        assert!(evaluator.evaluate(&[user("I want a job")]).qualified);
    }

    #[test]
    fn test_email_plausibility() {
        assert!(is_plausible_email("jane@example.com"));
        assert!(is_plausible_email("  jane.doe@mail.example.org "));
        assert!(!is_plausible_email("jane@example"));
        assert!(!is_plausible_email("jane example.com"));
        assert!(!is_plausible_email(""));
    }

    #[test]
    fn test_transition_turn() {
        let progress = evaluate(&interview(&[
            "experience",
            "javascript",
            "I'm Jane, I have 8 years of React and AWS experience and I lead a team",
        ]));
        let turn = transition_turn(&progress);

        assert_eq!(turn.role, TurnRole::Transition);
        assert!(turn.text.contains("3 thoughtful responses"));
        assert!(turn.text.contains("Name: Jane"));
        let meta = turn.metadata.unwrap();
        assert!(meta.qualified);
        assert_eq!(meta.interview_score, progress.cumulative_score);
        assert_eq!(meta.candidate_profile.response_count, 3);
    }

    #[test]
    fn test_scores_above_ten_are_shown_as_is() {
        let transcript = interview(&[
            "senior lead architect principal manager director with years of experience",
            "react python aws api database typescript node javascript",
            "I'm Sam and I'm hiring for this role",
        ]);
        let progress = evaluate(&transcript);
        assert!(progress.cumulative_score > 10);

        let expected = format!("Qualification Score: {}/10", progress.cumulative_score);
        assert!(transition_turn(&progress).text.contains(&expected));

        let handoff = CandidateHandoff {
            name: "Sam".into(),
            email: "sam@example.com".into(),
            company: Some("Acme".into()),
            progress,
            transcript_snapshot: transcript,
        };
        let expected = format!(
            "**Qualification Score:** {}/10",
            handoff.progress.cumulative_score
        );
        assert!(handoff_message(&handoff, 200).contains(&expected));
    }

    #[test]
    fn test_handoff_message() {
        let transcript = interview(&["I led teams", "Python and AWS", "I'm looking for a role"]);
        let handoff = CandidateHandoff {
            name: "Jane".into(),
            email: "jane@example.com".into(),
            company: None,
            progress: evaluate(&transcript),
            transcript_snapshot: transcript,
        };
        let message = handoff_message(&handoff, 10);

        assert!(message.starts_with("🔥 QUALIFIED CANDIDATE READY FOR LIVE CHAT"));
        assert!(message.contains("**Company:** Not specified"));
        assert!(message.contains("**Responses:** 3"));
        assert!(message.contains("I led team..."));
        assert!(message.contains("👤 Candidate: Python and AWS"));
        assert!(message.contains("🤖 AI: Tell me more about that."));
        assert!(!message.contains("welcome"));
    }
}
