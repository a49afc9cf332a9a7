//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants;
use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// External completion API
    #[serde(default)]
    pub completion: CompletionConfig,

    /// IP enrichment for visitor classification
    #[serde(default)]
    pub geo: GeoConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub interview: InterviewConfig,

    /// Team-chat webhook
    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub live_chat: LiveChatConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Markdown biography used as the base system prompt
    #[serde(default = "default_biography_path")]
    pub biography_path: String,
}

fn default_biography_path() -> String {
    "config/biography.md".to_string()
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_completion()?;
        self.validate_classifier()?;
        self.validate_interview()?;

        if self.environment.is_production() {
            if !self.completion.is_configured() {
                tracing::warn!("completion.api_key is not set; the assistant will be unavailable");
            }
            if !self.notifications.is_configured() {
                tracing::warn!(
                    "notifications.slack_webhook_url is not set; notifications will fail"
                );
            }
        }

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.server.body_limit_bytes < 1024 {
            return Err(ConfigError::InvalidValue {
                field: "server.body_limit_bytes".to_string(),
                message: format!(
                    "Body limit too low (minimum 1024), got {}",
                    self.server.body_limit_bytes
                ),
            });
        }

        Ok(())
    }

    fn validate_completion(&self) -> Result<(), ConfigError> {
        let completion = &self.completion;

        if completion.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "completion.model".to_string(),
                message: "Model cannot be empty".to_string(),
            });
        }

        if completion.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "completion.max_tokens".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&completion.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "completion.temperature".to_string(),
                message: format!(
                    "Must be between 0.0 and 1.0, got {}",
                    completion.temperature
                ),
            });
        }

        Ok(())
    }

    fn validate_classifier(&self) -> Result<(), ConfigError> {
        let c = &self.classifier;

        if c.business_hours_start > c.business_hours_end || c.business_hours_end > 23 {
            return Err(ConfigError::InvalidValue {
                field: "classifier.business_hours_start".to_string(),
                message: format!(
                    "Invalid business hours {}..={}",
                    c.business_hours_start, c.business_hours_end
                ),
            });
        }

        if !(1..=MAX_LONG_SESSION_MINUTES).contains(&c.long_session_minutes) {
            return Err(ConfigError::InvalidValue {
                field: "classifier.long_session_minutes".to_string(),
                message: format!(
                    "Must be between 1 and {}, got {}",
                    MAX_LONG_SESSION_MINUTES, c.long_session_minutes
                ),
            });
        }

        Ok(())
    }

    fn validate_interview(&self) -> Result<(), ConfigError> {
        if self.interview.min_user_turns == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interview.min_user_turns".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed origins; empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Largest accepted request body
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Completion API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Falls back to `CLAUDE_API_KEY` or `ANTHROPIC_API_KEY`
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request deadline; the HTTP client default applies when unset
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_api_key() -> Option<String> {
    std::env::var("CLAUDE_API_KEY")
        .or_else(|_| std::env::var("ANTHROPIC_API_KEY"))
        .ok()
        .filter(|k| !k.trim().is_empty())
}

fn default_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

impl CompletionConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            endpoint: default_endpoint(),
            api_version: default_api_version(),
            timeout_seconds: None,
        }
    }
}

/// IP lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// URL template; `{ip}` is replaced with the visitor address
    #[serde(default = "default_geo_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_geo_timeout")]
    pub timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_geo_endpoint() -> String {
    "http://ip-api.com/json/{ip}?fields=status,message,country,regionName,city,isp,org".to_string()
}

fn default_geo_timeout() -> u64 {
    1500
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_geo_endpoint(),
            timeout_ms: default_geo_timeout(),
        }
    }
}

/// Points awarded by the recruiter classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_threshold")]
    pub threshold: i32,
    #[serde(default = "default_professional_network_points")]
    pub professional_network_points: i32,
    #[serde(default = "default_job_board_points")]
    pub job_board_points: i32,
    /// Awarded when the message count exceeds `engaged_message_count`
    #[serde(default = "default_engaged_points")]
    pub engaged_points: i32,
    #[serde(default = "default_engaged_message_count")]
    pub engaged_message_count: u32,
    #[serde(default = "default_business_timezone_points")]
    pub business_timezone_points: i32,
    #[serde(default = "default_large_screen_points")]
    pub large_screen_points: i32,
    #[serde(default = "default_large_screen_width")]
    pub large_screen_min_width: u32,
    #[serde(default = "default_long_session_points")]
    pub long_session_points: i32,
    #[serde(default = "default_long_session_minutes")]
    pub long_session_minutes: i64,
    #[serde(default = "default_recruiting_org_points")]
    pub recruiting_org_points: i32,
    #[serde(default = "default_corporate_org_points")]
    pub corporate_org_points: i32,
    #[serde(default = "default_business_hours_points")]
    pub business_hours_points: i32,
    #[serde(default = "default_business_hours_start")]
    pub business_hours_start: u32,
    #[serde(default = "default_business_hours_end")]
    pub business_hours_end: u32,
    #[serde(default = "default_recruiting_app_points")]
    pub recruiting_app_points: i32,
}

fn default_threshold() -> i32 {
    constants::classification::RECRUITER_THRESHOLD
}
fn default_professional_network_points() -> i32 {
    40
}
fn default_job_board_points() -> i32 {
    35
}
fn default_engaged_points() -> i32 {
    15
}
fn default_engaged_message_count() -> u32 {
    3
}
fn default_business_timezone_points() -> i32 {
    8
}
fn default_large_screen_points() -> i32 {
    5
}
fn default_large_screen_width() -> u32 {
    1920
}
fn default_long_session_points() -> i32 {
    10
}
/// One week
const MAX_LONG_SESSION_MINUTES: i64 = 7 * 24 * 60;

fn default_long_session_minutes() -> i64 {
    5
}
fn default_recruiting_org_points() -> i32 {
    30
}
fn default_corporate_org_points() -> i32 {
    10
}
fn default_business_hours_points() -> i32 {
    5
}
fn default_business_hours_start() -> u32 {
    9
}
fn default_business_hours_end() -> u32 {
    17
}
fn default_recruiting_app_points() -> i32 {
    20
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            professional_network_points: default_professional_network_points(),
            job_board_points: default_job_board_points(),
            engaged_points: default_engaged_points(),
            engaged_message_count: default_engaged_message_count(),
            business_timezone_points: default_business_timezone_points(),
            large_screen_points: default_large_screen_points(),
            large_screen_min_width: default_large_screen_width(),
            long_session_points: default_long_session_points(),
            long_session_minutes: default_long_session_minutes(),
            recruiting_org_points: default_recruiting_org_points(),
            corporate_org_points: default_corporate_org_points(),
            business_hours_points: default_business_hours_points(),
            business_hours_start: default_business_hours_start(),
            business_hours_end: default_business_hours_end(),
            recruiting_app_points: default_recruiting_app_points(),
        }
    }
}

/// Interview qualification and hand-off
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewConfig {
    #[serde(default = "default_min_user_turns")]
    pub min_user_turns: usize,

    #[serde(default = "default_min_score")]
    pub min_score: u32,

    /// Delay before the transition turn is shown
    #[serde(default = "default_transition_delay")]
    pub transition_delay_ms: u64,

    #[serde(default = "default_experience_chars")]
    pub handoff_experience_chars: usize,
}

fn default_min_user_turns() -> usize {
    constants::interview::MIN_USER_TURNS
}

fn default_min_score() -> u32 {
    constants::interview::MIN_SCORE
}

fn default_transition_delay() -> u64 {
    constants::interview::TRANSITION_DELAY_MS
}

fn default_experience_chars() -> usize {
    constants::interview::HANDOFF_EXPERIENCE_CHARS
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            min_user_turns: default_min_user_turns(),
            min_score: default_min_score(),
            transition_delay_ms: default_transition_delay(),
            handoff_experience_chars: default_experience_chars(),
        }
    }
}

/// Team-chat webhook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Falls back to `SLACK_WEBHOOK_URL`
    #[serde(default = "default_webhook_url")]
    pub slack_webhook_url: Option<String>,

    /// Shown in message footers
    #[serde(default = "default_site_name")]
    pub site_name: String,

    #[serde(default = "default_notification_timeout")]
    pub timeout_ms: u64,
}

fn default_webhook_url() -> Option<String> {
    std::env::var("SLACK_WEBHOOK_URL")
        .ok()
        .filter(|u| !u.trim().is_empty())
}

fn default_site_name() -> String {
    "portfolio site".to_string()
}

fn default_notification_timeout() -> u64 {
    5000
}

impl NotificationConfig {
    pub fn is_configured(&self) -> bool {
        self.slack_webhook_url
            .as_deref()
            .map(|u| !u.trim().is_empty())
            .unwrap_or(false)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: default_webhook_url(),
            site_name: default_site_name(),
            timeout_ms: default_notification_timeout(),
        }
    }
}

/// Live-chat WebSocket relay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveChatConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Shared secret for the operator reply endpoint
    #[serde(default)]
    pub operator_token: Option<String>,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for LiveChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            operator_token: None,
            channel_capacity: default_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from the standard locations
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(env, None)
}

/// Load settings, layering an explicit file over the standard locations
pub fn load_settings_from(env: Option<&str>, path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        builder = builder.add_source(File::from(path));
    }

    builder = builder.add_source(
        Environment::with_prefix("CAREER_ASSISTANT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.completion.model, "claude-3-haiku-20240307");
        assert_eq!(settings.completion.max_tokens, 1000);
        assert_eq!(settings.classifier.threshold, 30);
        assert_eq!(settings.interview.min_user_turns, 3);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_temperature_validation() {
        let mut settings = Settings::default();
        settings.completion.temperature = 1.5;
        assert!(settings.validate().is_err());

        settings.completion.temperature = 0.2;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_port_validation() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_business_hours_validation() {
        let mut settings = Settings::default();
        settings.classifier.business_hours_start = 18;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_long_session_minutes_validation() {
        let mut settings = Settings::default();
        settings.classifier.long_session_minutes = 0;
        assert!(settings.validate().is_err());

        settings.classifier.long_session_minutes = i64::MAX;
        assert!(settings.validate().is_err());

        settings.classifier.long_session_minutes = 30;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_is_configured_ignores_blank_values() {
        let mut completion = CompletionConfig::default();
        completion.api_key = Some("   ".to_string());
        assert!(!completion.is_configured());
        completion.api_key = Some("sk-test".to_string());
        assert!(completion.is_configured());

        let mut notifications = NotificationConfig::default();
        notifications.slack_webhook_url = None;
        assert!(!notifications.is_configured());
    }

    #[test]
    fn test_load_from_file() {
        let file = yaml_file(
            r#"
environment: production
server:
  port: 9090
completion:
  api_key: sk-from-file
  temperature: 0.3
interview:
  transition_delay_ms: 0
"#,
        );

        let settings = load_settings_from(None, Some(file.path())).unwrap();
        assert_eq!(settings.environment, RuntimeEnvironment::Production);
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.completion.api_key.as_deref(), Some("sk-from-file"));
        assert_eq!(settings.interview.transition_delay_ms, 0);
        assert_eq!(settings.interview.min_score, 5);
    }

    #[test]
    fn test_invalid_file_value_rejected() {
        let file = yaml_file("completion:\n  max_tokens: 0\n");
        assert!(load_settings_from(None, Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = load_settings_from(None, Some(Path::new("/nonexistent/settings.yaml")));
        assert!(matches!(err, Err(ConfigError::FileNotFound(_))));
    }
}
