//! Optional settings file loaded from TOML
//!
//! Every section is optional; a missing file or section falls back to the
//! defaults below.
//!
//! ```toml
//! [models]
//! cheap = "gpt-3.5-turbo"
//! premium = "gpt-4"
//!
//! [rates]
//! cheap_per_1k = 0.002
//! premium_per_1k = 0.06
//!
//! [transcript]
//! dir = "conversations"
//! prefix = "question"
//!
//! [api]
//! base_url = "https://api.openai.com/v1"
//! timeout_secs = 120
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::ModelTier;

/// Root settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Model identifiers for each tier
    #[serde(default)]
    pub models: ModelSettings,

    /// Dollar rates used for the cost estimate
    #[serde(default)]
    pub rates: RateSettings,

    /// Where transcripts are written
    #[serde(default)]
    pub transcript: TranscriptSettings,

    /// Completion API endpoint
    #[serde(default)]
    pub api: ApiSettings,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load settings from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.models.cheap.trim().is_empty() || self.models.premium.trim().is_empty() {
            return Err(ConfigError::Validation("model identifiers must not be empty".into()));
        }
        if self.rates.cheap_per_1k < 0.0 || self.rates.premium_per_1k < 0.0 {
            return Err(ConfigError::Validation("rates must not be negative".into()));
        }
        if self.transcript.prefix.trim().is_empty() {
            return Err(ConfigError::Validation("transcript prefix must not be empty".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Validation("api.timeout_secs must be at least 1".into()));
        }
        Ok(())
    }
}

/// Model identifiers sent to the API for each tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_cheap_model")]
    pub cheap: String,

    #[serde(default = "default_premium_model")]
    pub premium: String,
}

fn default_cheap_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_premium_model() -> String {
    "gpt-4".to_string()
}

impl ModelSettings {
    pub fn id(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Cheap => &self.cheap,
            ModelTier::Premium => &self.premium,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            cheap: default_cheap_model(),
            premium: default_premium_model(),
        }
    }
}

/// Dollars per 1000 tokens for each tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSettings {
    #[serde(default = "default_cheap_rate")]
    pub cheap_per_1k: f64,

    #[serde(default = "default_premium_rate")]
    pub premium_per_1k: f64,
}

fn default_cheap_rate() -> f64 {
    0.002
}

fn default_premium_rate() -> f64 {
    0.06
}

impl RateSettings {
    pub fn per_token(&self, tier: ModelTier) -> f64 {
        match tier {
            ModelTier::Cheap => self.cheap_per_1k / 1000.0,
            ModelTier::Premium => self.premium_per_1k / 1000.0,
        }
    }
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            cheap_per_1k: default_cheap_rate(),
            premium_per_1k: default_premium_rate(),
        }
    }
}

/// Transcript location and naming
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSettings {
    #[serde(default = "default_transcript_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_transcript_prefix")]
    pub prefix: String,
}

fn default_transcript_dir() -> PathBuf {
    PathBuf::from("conversations")
}

fn default_transcript_prefix() -> String {
    "question".to_string()
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            dir: default_transcript_dir(),
            prefix: default_transcript_prefix(),
        }
    }
}

/// Completion API endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_SETTINGS: &str = r#"
[models]
cheap = "gpt-4o-mini"
premium = "gpt-4o"

[rates]
cheap_per_1k = 0.00015
premium_per_1k = 0.005

[transcript]
dir = "runs"
prefix = "ask"

[api]
base_url = "http://localhost:8000/v1"
timeout_secs = 300
"#;

    #[test]
    fn test_parse_settings() {
        let settings = Settings::from_toml(SAMPLE_SETTINGS).unwrap();

        assert_eq!(settings.models.id(ModelTier::Cheap), "gpt-4o-mini");
        assert_eq!(settings.models.id(ModelTier::Premium), "gpt-4o");
        assert_eq!(settings.rates.premium_per_1k, 0.005);
        assert_eq!(settings.transcript.dir, PathBuf::from("runs"));
        assert_eq!(settings.transcript.prefix, "ask");
        assert_eq!(settings.api.timeout_secs, 300);
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = Settings::from_toml("").unwrap();

        assert_eq!(settings.models.cheap, "gpt-3.5-turbo");
        assert_eq!(settings.models.premium, "gpt-4");
        assert_eq!(settings.rates.per_token(ModelTier::Cheap), 0.002 / 1000.0);
        assert_eq!(settings.transcript.dir, PathBuf::from("conversations"));
        assert_eq!(settings.transcript.prefix, "question");
        assert_eq!(settings.api.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_partial_section() {
        let settings = Settings::from_toml("[models]\npremium = \"gpt-4-turbo\"\n").unwrap();
        assert_eq!(settings.models.cheap, "gpt-3.5-turbo");
        assert_eq!(settings.models.premium, "gpt-4-turbo");
    }

    #[test]
    fn test_rejects_negative_rate() {
        let err = Settings::from_toml("[rates]\ncheap_per_1k = -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = Settings::from_toml("[api]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("timeout_secs")));
    }
}
