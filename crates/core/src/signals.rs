//! Visitor signals and the classification derived from them

use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Longest session duration taken at face value (one year)
const MAX_SESSION_MS: u64 = 365 * 24 * 60 * 60 * 1000;

/// Behavioral telemetry reported by the browser with each request.
///
/// Every field is optional; absent values simply contribute nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserTelemetry {
    /// IANA timezone name, e.g. `America/Chicago`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Minutes east of UTC (New York in winter is -300)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone_offset_minutes: Option<i32>,
    /// `WIDTHxHEIGHT`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_resolution: Option<String>,
    /// Milliseconds since the visitor opened the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<u32>,
}

/// Result of an IP-to-organization lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub organization: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl GeoInfo {
    /// Human readable location, `None` when nothing is known
    pub fn location(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.city, &self.region, &self.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Everything known about a visitor for a single request.
///
/// Built fresh per request and discarded with the response.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitorSignals {
    pub source_organization: Option<String>,
    pub source_location: Option<String>,
    pub referrer_url: String,
    pub user_agent: String,
    pub timezone: String,
    pub timezone_offset_minutes: Option<i32>,
    pub screen_resolution: String,
    pub session_start_time: DateTime<Utc>,
    /// Wall-clock time the request was received
    pub request_time: DateTime<Utc>,
    pub message_count_so_far: u32,
}

impl VisitorSignals {
    /// Signals with nothing but a request time
    pub fn empty(request_time: DateTime<Utc>) -> Self {
        Self {
            source_organization: None,
            source_location: None,
            referrer_url: String::new(),
            user_agent: String::new(),
            timezone: String::new(),
            timezone_offset_minutes: None,
            screen_resolution: String::new(),
            session_start_time: request_time,
            request_time,
            message_count_so_far: 0,
        }
    }

    /// Merge browser telemetry into the signals
    pub fn with_telemetry(mut self, telemetry: &BrowserTelemetry) -> Self {
        if let Some(tz) = &telemetry.timezone {
            self.timezone = tz.clone();
        }
        self.timezone_offset_minutes = telemetry.timezone_offset_minutes;
        if let Some(res) = &telemetry.screen_resolution {
            self.screen_resolution = res.clone();
        }
        if let Some(count) = telemetry.message_count {
            self.message_count_so_far = count;
        }
        if let Some(ms) = telemetry.session_duration {
            let elapsed = Duration::milliseconds(ms.min(MAX_SESSION_MS) as i64);
            self.session_start_time = self
                .request_time
                .checked_sub_signed(elapsed)
                .unwrap_or(self.request_time);
        }
        self
    }

    /// Merge a geo lookup result into the signals
    pub fn with_geo(mut self, geo: &GeoInfo) -> Self {
        self.source_organization = geo
            .organization
            .as_ref()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());
        self.source_location = geo.location();
        self
    }

    pub fn session_duration(&self) -> Duration {
        self.request_time - self.session_start_time
    }

    /// Visitor's local hour. A reported UTC offset wins over the IANA
    /// timezone name; `None` when neither is usable.
    pub fn local_hour(&self) -> Option<u32> {
        if let Some(offset) = self.timezone_offset_minutes {
            let local = self
                .request_time
                .checked_add_signed(Duration::minutes(i64::from(offset)))?;
            return Some(local.hour());
        }

        let tz: Tz = self.timezone.trim().parse().ok()?;
        Some(self.request_time.with_timezone(&tz).hour())
    }
}

/// Outcome of scoring a visitor.
///
/// `is_likely_recruiter` is always `score >= threshold`; the only way to
/// build one is through [`ClassificationResult::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    score: i32,
    is_likely_recruiter: bool,
    matched_signal_tags: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
}

impl ClassificationResult {
    pub fn new(score: i32, threshold: i32, matched_signal_tags: BTreeSet<String>) -> Self {
        Self {
            score,
            is_likely_recruiter: score >= threshold,
            matched_signal_tags,
            company: None,
            location: None,
        }
    }

    /// Attach the inferred company and location
    pub fn with_origin(mut self, company: Option<String>, location: Option<String>) -> Self {
        self.company = company;
        self.location = location;
        self
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn is_likely_recruiter(&self) -> bool {
        self.is_likely_recruiter
    }

    pub fn matched_signal_tags(&self) -> &BTreeSet<String> {
        &self.matched_signal_tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.matched_signal_tags.contains(tag)
    }

    pub fn company(&self) -> Option<&str> {
        self.company.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn has_company_info(&self) -> bool {
        self.company.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 12, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_local_hour_uses_offset() {
        let telemetry = BrowserTelemetry {
            timezone_offset_minutes: Some(-300),
            ..Default::default()
        };
        let signals = VisitorSignals::empty(noon_utc()).with_telemetry(&telemetry);
        assert_eq!(signals.local_hour(), Some(7));
    }

    #[test]
    fn test_local_hour_unknown_without_offset() {
        assert_eq!(VisitorSignals::empty(noon_utc()).local_hour(), None);
    }

    #[test]
    fn test_local_hour_from_timezone_name() {
        let telemetry = BrowserTelemetry {
            timezone: Some("America/New_York".into()),
            ..Default::default()
        };
        // 12:00 UTC on 12 March 2024 is 08:00 EDT
        let signals = VisitorSignals::empty(noon_utc()).with_telemetry(&telemetry);
        assert_eq!(signals.local_hour(), Some(8));

        let mut signals = signals;
        signals.timezone = "Not/AZone".into();
        assert_eq!(signals.local_hour(), None);
    }

    #[test]
    fn test_offset_overrides_timezone_name() {
        let telemetry = BrowserTelemetry {
            timezone: Some("America/New_York".into()),
            timezone_offset_minutes: Some(60),
            ..Default::default()
        };
        let signals = VisitorSignals::empty(noon_utc()).with_telemetry(&telemetry);
        assert_eq!(signals.local_hour(), Some(13));
    }

    #[test]
    fn test_session_duration_from_telemetry() {
        let telemetry = BrowserTelemetry {
            session_duration: Some(6 * 60 * 1000),
            ..Default::default()
        };
        let signals = VisitorSignals::empty(noon_utc()).with_telemetry(&telemetry);
        assert_eq!(signals.session_duration(), Duration::minutes(6));
    }

    #[test]
    fn test_geo_location_joins_known_parts() {
        let geo = GeoInfo {
            organization: Some("  Acme Corp ".into()),
            city: Some("Austin".into()),
            region: None,
            country: Some("United States".into()),
        };
        let signals = VisitorSignals::empty(noon_utc()).with_geo(&geo);
        assert_eq!(signals.source_organization.as_deref(), Some("Acme Corp"));
        assert_eq!(
            signals.source_location.as_deref(),
            Some("Austin, United States")
        );
    }

    #[test]
    fn test_blank_organization_is_dropped() {
        let geo = GeoInfo {
            organization: Some("   ".into()),
            ..Default::default()
        };
        let signals = VisitorSignals::empty(noon_utc()).with_geo(&geo);
        assert!(signals.source_organization.is_none());
        assert!(signals.source_location.is_none());
    }

    #[test]
    fn test_classification_threshold_invariant() {
        let below = ClassificationResult::new(29, 30, BTreeSet::new());
        let at = ClassificationResult::new(30, 30, BTreeSet::new());
        assert!(!below.is_likely_recruiter());
        assert!(at.is_likely_recruiter());
        assert!(!at.has_company_info());
    }

    #[test]
    fn test_telemetry_deserializes_camel_case() {
        let telemetry: BrowserTelemetry = serde_json::from_str(
            r#"{"timezone":"Europe/London","screenResolution":"1920x1080","messageCount":4}"#,
        )
        .unwrap();
        assert_eq!(telemetry.timezone.as_deref(), Some("Europe/London"));
        assert_eq!(telemetry.screen_resolution.as_deref(), Some("1920x1080"));
        assert_eq!(telemetry.message_count, Some(4));
    }
}
