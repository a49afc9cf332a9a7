//! Configuration management for the career assistant
//!
//! Supports loading configuration from:
//! - YAML files (`config/default`, `config/{environment}`, an explicit path)
//! - Environment variables (`CAREER_ASSISTANT__` prefix, `__` separator)
//! - Legacy variables for credentials (`CLAUDE_API_KEY`, `SLACK_WEBHOOK_URL`)

pub mod biography;
pub mod constants;
pub mod settings;

pub use biography::Biography;
pub use settings::{
    load_settings, load_settings_from, ClassifierConfig, CompletionConfig, GeoConfig,
    InterviewConfig, LiveChatConfig, NotificationConfig, ObservabilityConfig,
    RuntimeEnvironment, ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
