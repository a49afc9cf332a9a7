//! System prompt composition
//!
//! The prompt is the biography followed, when the visitor's organization
//! is known, by a short visitor-context block. It is rebuilt per request
//! because the classification can change from turn to turn.

use career_assistant_config::Biography;
use career_assistant_core::ClassificationResult;

/// How the assistant should lean given the visitor's organization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneAdjustment {
    /// Recruiting, staffing and HR contacts
    Leadership,
    /// Engineering and software companies
    Technical,
    /// Startups and venture-backed companies
    Growth,
    Professional,
}

const RECRUITING_TERMS: &[&str] = &[
    "recruit", "staffing", "talent", "human resources", "hr ", " hr", "hiring", "headhunt",
    "personnel", "placement", "workforce",
];

const TECH_TERMS: &[&str] = &[
    "tech", "software", "systems", "cloud", "data", "digital", "computing", "google",
    "microsoft", "amazon", "apple", "meta", "salesforce", "oracle", "ibm", "github", " ai ",
];

const STARTUP_TERMS: &[&str] = &[
    "startup", "start-up", "ventures", "labs", "studio", "capital", "incubator", "accelerator",
];

impl ToneAdjustment {
    /// Pick a tone from the organization name
    pub fn for_organization(organization: &str) -> Self {
        let org = format!(" {} ", organization.to_lowercase());
        let has = |terms: &[&str]| terms.iter().any(|t| org.contains(t));

        if has(RECRUITING_TERMS) {
            ToneAdjustment::Leadership
        } else if has(TECH_TERMS) {
            ToneAdjustment::Technical
        } else if has(STARTUP_TERMS) {
            ToneAdjustment::Growth
        } else {
            ToneAdjustment::Professional
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            ToneAdjustment::Leadership => {
                "Emphasize leadership, team building, hiring experience and culture. \
                 Keep technical detail light unless asked."
            },
            ToneAdjustment::Technical => {
                "Be more technical: discuss architecture decisions, technology choices \
                 and measurable engineering outcomes."
            },
            ToneAdjustment::Growth => {
                "Focus on growth: shipping quickly, scaling teams and systems, and \
                 comfort with ambiguity."
            },
            ToneAdjustment::Professional => {
                "Keep a polished professional tone and relate experience to their business."
            },
        }
    }
}

/// Compose the system prompt for one request
pub fn compose(biography: &Biography, classification: &ClassificationResult) -> String {
    let mut prompt = biography.text().to_string();

    if let Some(company) = classification.company().filter(|_| classification.has_company_info())
    {
        let tone = ToneAdjustment::for_organization(company);

        prompt.push_str("\n\n## Visitor Context\n");
        match classification.location() {
            Some(location) => prompt.push_str(&format!(
                "This visitor appears to be connecting from {} ({}).\n",
                company, location
            )),
            None => prompt.push_str(&format!(
                "This visitor appears to be connecting from {}.\n",
                company
            )),
        }
        prompt.push_str(tone.instruction());
        prompt.push('\n');

        if classification.is_likely_recruiter() {
            prompt.push_str(
                "They are likely a recruiter or hiring manager: highlight achievements, \
                 availability and how to get in touch.\n",
            );
        }
        prompt.push_str("Do not mention that you know where they are connecting from.\n");
    }

    prompt
}

/// Holds the biography so callers only pass the classification
#[derive(Debug, Clone)]
pub struct PromptComposer {
    biography: Biography,
}

impl PromptComposer {
    pub fn new(biography: Biography) -> Self {
        Self { biography }
    }

    pub fn compose(&self, classification: &ClassificationResult) -> String {
        compose(&self.biography, classification)
    }

    pub fn biography(&self) -> &Biography {
        &self.biography
    }
}
