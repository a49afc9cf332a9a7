//! Recruiter Classifier
//!
//! Additive point system over a visitor's request signals:
//! - Referrer: professional network (+40) or job board (+35)
//! - Behavior: message count, session length, screen size
//! - Time: business timezone during local business hours, request hour
//! - Network origin: recruiting vocabulary (+30) or any non-ISP organization (+10)
//! - User agent: recruiting platform in-app browsers (+20)
//!
//! Each request is scored from its own signals only; nothing is cached
//! between turns.

use chrono::{Duration, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use career_assistant_config::ClassifierConfig;
use career_assistant_core::{ClassificationResult, VisitorSignals};

/// Tags recorded in [`ClassificationResult::matched_signal_tags`]
pub mod tags {
    pub const PROFESSIONAL_NETWORK: &str = "professional_network_referrer";
    pub const JOB_BOARD: &str = "job_board_referrer";
    pub const ENGAGED: &str = "engaged_conversation";
    pub const BUSINESS_TIMEZONE: &str = "business_timezone";
    pub const LARGE_SCREEN: &str = "large_screen";
    pub const LONG_SESSION: &str = "long_session";
    pub const RECRUITING_ORG: &str = "recruiting_organization";
    pub const CORPORATE_NETWORK: &str = "corporate_network";
    pub const BUSINESS_HOURS: &str = "business_hours";
    pub const RECRUITING_APP: &str = "recruiting_app";
}

const PROFESSIONAL_NETWORK_DOMAINS: &[&str] = &["linkedin.com", "lnkd.in", "xing.com"];

const JOB_BOARD_DOMAINS: &[&str] = &[
    "indeed.com",
    "glassdoor.com",
    "monster.com",
    "ziprecruiter.com",
    "dice.com",
    "careerbuilder.com",
    "simplyhired.com",
    "wellfound.com",
    "angel.co",
    "hired.com",
    "greenhouse.io",
    "lever.co",
    "workable.com",
    "otta.com",
];

const BUSINESS_TIMEZONES: &[&str] = &[
    "America/New_York",
    "America/Chicago",
    "America/Denver",
    "America/Phoenix",
    "America/Los_Angeles",
    "America/Toronto",
    "America/Vancouver",
    "Europe/London",
    "Europe/Dublin",
    "Europe/Amsterdam",
    "Europe/Berlin",
    "Europe/Paris",
    "Europe/Zurich",
    "Asia/Singapore",
    "Asia/Tokyo",
    "Asia/Kolkata",
    "Australia/Sydney",
];

/// Residential and wireless carriers; never count as a corporate network
const CONSUMER_ISP_FRAGMENTS: &[&str] = &[
    "comcast",
    "xfinity",
    "verizon",
    "at&t",
    "spectrum",
    "charter communications",
    "cox communications",
    "t-mobile",
    "sprint",
    "centurylink",
    "frontier communications",
    "windstream",
    "mediacom",
    "optimum",
    "altice",
    "suddenlink",
    "earthlink",
    "google fiber",
    "starlink",
    "rogers communications",
    "bell canada",
    "shaw communications",
    "vodafone",
    "virgin media",
    "british telecommunications",
    "sky broadband",
    "talktalk",
    "deutsche telekom",
    "telstra",
    "reliance jio",
    "bharti airtel",
];

const RECRUITING_APP_MARKERS: &[&str] = &[
    "linkedinapp",
    "linkedin",
    "indeed",
    "glassdoor",
    "ziprecruiter",
    "greenhouse",
    "workday",
];

static RECRUITING_ORG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(recruit\w*|staffing|talent|human resources|hr|hiring|headhunt\w*|personnel|placement|search partners|workforce solutions)\b",
    )
    .expect("recruiting vocabulary pattern is valid")
});

static RESOLUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{3,5})\s*[xX×]\s*(\d{3,5})\s*$").expect("resolution pattern is valid")
});

/// Classify one request's signals
pub fn classify(signals: &VisitorSignals, config: &ClassifierConfig) -> ClassificationResult {
    let mut score = 0;
    let mut matched = BTreeSet::new();
    let mut award = |points: i32, tag: &str| {
        score += points;
        matched.insert(tag.to_string());
    };

    let referrer = signals.referrer_url.to_lowercase();
    if contains_any(&referrer, PROFESSIONAL_NETWORK_DOMAINS) {
        award(config.professional_network_points, tags::PROFESSIONAL_NETWORK);
    }
    if contains_any(&referrer, JOB_BOARD_DOMAINS) {
        award(config.job_board_points, tags::JOB_BOARD);
    }

    if signals.message_count_so_far > config.engaged_message_count {
        award(config.engaged_points, tags::ENGAGED);
    }

    let business_hours = config.business_hours_start..=config.business_hours_end;

    if is_business_timezone(&signals.timezone)
        && signals
            .local_hour()
            .map(|h| business_hours.contains(&h))
            .unwrap_or(false)
    {
        award(config.business_timezone_points, tags::BUSINESS_TIMEZONE);
    }

    if screen_width(&signals.screen_resolution)
        .map(|w| w >= config.large_screen_min_width)
        .unwrap_or(false)
    {
        award(config.large_screen_points, tags::LARGE_SCREEN);
    }

    if signals.session_duration() > Duration::minutes(config.long_session_minutes) {
        award(config.long_session_points, tags::LONG_SESSION);
    }

    if let Some(org) = signals.source_organization.as_deref() {
        if is_recruiting_organization(org) {
            award(config.recruiting_org_points, tags::RECRUITING_ORG);
        } else if !is_consumer_isp(org) {
            award(config.corporate_org_points, tags::CORPORATE_NETWORK);
        }
    }

    if business_hours.contains(&signals.request_time.hour()) {
        award(config.business_hours_points, tags::BUSINESS_HOURS);
    }

    if contains_any(&signals.user_agent.to_lowercase(), RECRUITING_APP_MARKERS) {
        award(config.recruiting_app_points, tags::RECRUITING_APP);
    }

    let result = ClassificationResult::new(score, config.threshold, matched).with_origin(
        signals.source_organization.clone(),
        signals.source_location.clone(),
    );

    tracing::debug!(
        score = result.score(),
        recruiter = result.is_likely_recruiter(),
        tags = ?result.matched_signal_tags(),
        "Visitor classified"
    );

    result
}

/// Stateless wrapper holding the point table
#[derive(Debug, Clone, Default)]
pub struct RecruiterClassifier {
    config: ClassifierConfig,
}

impl RecruiterClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, signals: &VisitorSignals) -> ClassificationResult {
        classify(signals, &self.config)
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

pub fn is_business_timezone(timezone: &str) -> bool {
    BUSINESS_TIMEZONES
        .iter()
        .any(|tz| tz.eq_ignore_ascii_case(timezone.trim()))
}

pub fn is_recruiting_organization(organization: &str) -> bool {
    RECRUITING_ORG.is_match(organization)
}

pub fn is_consumer_isp(organization: &str) -> bool {
    contains_any(&organization.to_lowercase(), CONSUMER_ISP_FRAGMENTS)
}

fn screen_width(resolution: &str) -> Option<u32> {
    let caps = RESOLUTION.captures(resolution)?;
    caps.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use career_assistant_core::BrowserTelemetry;
    use chrono::{DateTime, TimeZone, Utc};

    fn at_hour(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 14, hour, 30, 0).unwrap()
    }

    fn config() -> ClassifierConfig {
        ClassifierConfig::default()
    }

    #[test]
    fn test_no_signals_is_not_recruiter() {
        let result = classify(&VisitorSignals::empty(at_hour(3)), &config());
        assert_eq!(result.score(), 0);
        assert!(!result.is_likely_recruiter());
        assert!(result.matched_signal_tags().is_empty());
    }

    #[test]
    fn test_off_hours_without_referrer_or_company_never_recruiter() {
        for hour in (0..9).chain(18..24) {
            let mut signals = VisitorSignals::empty(at_hour(hour));
            signals.user_agent = "Mozilla/5.0 (Macintosh) Safari/605.1.15".into();
            signals.timezone = "America/Chicago".into();
            signals.screen_resolution = "1440x900".into();
            let result = classify(&signals, &config());
            assert!(!result.is_likely_recruiter(), "hour {} scored {}", hour, result.score());
        }
    }

    #[test]
    fn test_linkedin_referrer_scores_at_least_40() {
        for hour in [2, 11, 20] {
            let mut signals = VisitorSignals::empty(at_hour(hour));
            signals.referrer_url = "https://www.linkedin.com/in/someone/".into();
            let result = classify(&signals, &config());
            assert!(result.score() >= 40);
            assert!(result.is_likely_recruiter());
            assert!(result.has_tag(tags::PROFESSIONAL_NETWORK));
        }
    }

    #[test]
    fn test_referrer_match_is_case_insensitive() {
        let mut signals = VisitorSignals::empty(at_hour(2));
        signals.referrer_url = "HTTPS://WWW.INDEED.COM/viewjob".into();
        let result = classify(&signals, &config());
        assert_eq!(result.score(), 35);
        assert!(result.has_tag(tags::JOB_BOARD));
    }

    #[test]
    fn test_engagement_requires_more_than_three_messages() {
        let mut signals = VisitorSignals::empty(at_hour(2));
        signals.message_count_so_far = 3;
        assert_eq!(classify(&signals, &config()).score(), 0);

        signals.message_count_so_far = 4;
        assert_eq!(classify(&signals, &config()).score(), 15);
    }

    #[test]
    fn test_business_timezone_needs_local_business_hour() {
        // 14:30 UTC is 09:30 in Chicago (CDT, -300)
        let telemetry = BrowserTelemetry {
            timezone: Some("America/Chicago".into()),
            timezone_offset_minutes: Some(-300),
            ..Default::default()
        };
        let signals = VisitorSignals::empty(at_hour(14)).with_telemetry(&telemetry);
        let result = classify(&signals, &config());
        assert!(result.has_tag(tags::BUSINESS_TIMEZONE));

        // 03:30 UTC is 22:30 the previous day in Chicago
        let signals = VisitorSignals::empty(at_hour(3)).with_telemetry(&telemetry);
        assert!(!classify(&signals, &config()).has_tag(tags::BUSINESS_TIMEZONE));
    }

    #[test]
    fn test_business_timezone_from_name_alone() {
        // 15:30 UTC on 14 May is 11:30 in New York
        let telemetry = BrowserTelemetry {
            timezone: Some("America/New_York".into()),
            ..Default::default()
        };
        let signals = VisitorSignals::empty(at_hour(15)).with_telemetry(&telemetry);
        assert!(classify(&signals, &config()).has_tag(tags::BUSINESS_TIMEZONE));

        // 02:30 UTC is 22:30 the previous evening
        let signals = VisitorSignals::empty(at_hour(2)).with_telemetry(&telemetry);
        assert!(!classify(&signals, &config()).has_tag(tags::BUSINESS_TIMEZONE));
    }

    #[test]
    fn test_unknown_timezone_gets_no_points() {
        let telemetry = BrowserTelemetry {
            timezone: Some("Pacific/Chatham".into()),
            timezone_offset_minutes: Some(0),
            ..Default::default()
        };
        let signals = VisitorSignals::empty(at_hour(12)).with_telemetry(&telemetry);
        assert!(!classify(&signals, &config()).has_tag(tags::BUSINESS_TIMEZONE));
    }

    #[test]
    fn test_large_screen() {
        let mut signals = VisitorSignals::empty(at_hour(2));
        signals.screen_resolution = "2560x1440".into();
        assert!(classify(&signals, &config()).has_tag(tags::LARGE_SCREEN));

        signals.screen_resolution = "1366x768".into();
        assert!(!classify(&signals, &config()).has_tag(tags::LARGE_SCREEN));

        signals.screen_resolution = "garbage".into();
        assert!(!classify(&signals, &config()).has_tag(tags::LARGE_SCREEN));
    }

    #[test]
    fn test_long_session() {
        let five_minutes = BrowserTelemetry {
            session_duration: Some(5 * 60 * 1000),
            ..Default::default()
        };
        let signals = VisitorSignals::empty(at_hour(2)).with_telemetry(&five_minutes);
        assert!(!classify(&signals, &config()).has_tag(tags::LONG_SESSION));

        let longer = BrowserTelemetry {
            session_duration: Some(5 * 60 * 1000 + 1000),
            ..Default::default()
        };
        let signals = VisitorSignals::empty(at_hour(2)).with_telemetry(&longer);
        assert_eq!(classify(&signals, &config()).score(), 10);
    }

    #[test]
    fn test_recruiting_organization() {
        let mut signals = VisitorSignals::empty(at_hour(2));
        signals.source_organization = Some("Apex Staffing Group LLC".into());
        let result = classify(&signals, &config());
        assert_eq!(result.score(), 30);
        assert!(result.is_likely_recruiter());
        assert!(result.has_company_info());
        assert_eq!(result.company(), Some("Apex Staffing Group LLC"));
    }

    #[test]
    fn test_corporate_network_but_not_isp() {
        let mut signals = VisitorSignals::empty(at_hour(2));
        signals.source_organization = Some("Acme Manufacturing Inc".into());
        let result = classify(&signals, &config());
        assert_eq!(result.score(), 10);
        assert!(result.has_tag(tags::CORPORATE_NETWORK));

        signals.source_organization = Some("Comcast Cable Communications, LLC".into());
        let result = classify(&signals, &config());
        assert_eq!(result.score(), 0);
        assert!(result.matched_signal_tags().is_empty());
    }

    #[test]
    fn test_consumer_isp_case_insensitive() {
        assert!(is_consumer_isp("VERIZON BUSINESS"));
        assert!(is_consumer_isp("AT&T Services, Inc."));
        assert!(!is_consumer_isp("Globex Corporation"));
    }

    #[test]
    fn test_hr_vocabulary_whole_words() {
        assert!(is_recruiting_organization("Acme HR Services"));
        assert!(is_recruiting_organization("Recruiters United"));
        assert!(!is_recruiting_organization("Three Rivers Shredding"));
    }

    #[test]
    fn test_business_hours_boundaries() {
        for (hour, expected) in [(8, false), (9, true), (17, true), (18, false)] {
            let result = classify(&VisitorSignals::empty(at_hour(hour)), &config());
            assert_eq!(result.has_tag(tags::BUSINESS_HOURS), expected, "hour {}", hour);
        }
    }

    #[test]
    fn test_recruiting_app_user_agent() {
        let mut signals = VisitorSignals::empty(at_hour(2));
        signals.user_agent =
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0) [LinkedInApp]/9.29.4180".into();
        let result = classify(&signals, &config());
        assert_eq!(result.score(), 20);
        assert!(result.has_tag(tags::RECRUITING_APP));
    }

    #[test]
    fn test_points_accumulate() {
        let telemetry = BrowserTelemetry {
            message_count: Some(5),
            session_duration: Some(10 * 60 * 1000),
            screen_resolution: Some("1920x1080".into()),
            ..Default::default()
        };
        let mut signals = VisitorSignals::empty(at_hour(11)).with_telemetry(&telemetry);
        signals.referrer_url = "https://www.glassdoor.com/".into();

        let result = classify(&signals, &config());
        // 35 + 15 + 5 + 10 + 5
        assert_eq!(result.score(), 70);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let mut signals = VisitorSignals::empty(at_hour(10));
        signals.referrer_url = "https://lnkd.in/abc".into();
        signals.source_organization = Some("Talent Partners".into());

        let classifier = RecruiterClassifier::default();
        assert_eq!(classifier.classify(&signals), classifier.classify(&signals));
    }

    #[test]
    fn test_custom_threshold() {
        let config = ClassifierConfig {
            threshold: 5,
            ..Default::default()
        };
        let result = classify(&VisitorSignals::empty(at_hour(10)), &config);
        assert_eq!(result.score(), 5);
        assert!(result.is_likely_recruiter());
    }
}
