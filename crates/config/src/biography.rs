//! Static biography document used as the base system prompt

use std::path::Path;

use crate::ConfigError;

const BUILTIN: &str = include_str!("../assets/biography.md");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Biography {
    text: String,
}

impl Biography {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Document shipped with the crate
    pub fn builtin() -> Self {
        Self::new(BUILTIN.trim_end())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;

        if text.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "biography_path".to_string(),
                message: format!("{} is empty", path.display()),
            });
        }

        Ok(Self::new(text.trim_end()))
    }

    /// Load from `path`, falling back to the built-in document
    pub fn load_or_builtin(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(bio) => {
                tracing::info!(path = %path.display(), "Loaded biography");
                bio
            },
            Err(e) => {
                tracing::warn!(error = %e, "Using built-in biography");
                Self::builtin()
            },
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
