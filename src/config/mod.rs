//! Application configuration

pub mod prompts;
pub mod settings;

use std::env;
use std::fmt;
use std::str::FromStr;

pub use settings::{ApiSettings, ModelSettings, RateSettings, Settings, TranscriptSettings};

/// Connection settings resolved from the environment, falling back to the
/// `[api]` section of the settings file.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_organization: Option<String>,
    pub openai_base_url: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env(api: &ApiSettings) -> Self {
        Self::from_lookup(api, |key| env::var(key).ok())
    }

    fn from_lookup(api: &ApiSettings, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            openai_api_key: non_empty("OPENAI_API_KEY").or_else(|| non_empty("OPENAI_KEY")),
            openai_organization: non_empty("OPENAI_ORGANIZATION"),
            openai_base_url: non_empty("OPENAI_BASE_URL").unwrap_or_else(|| api.base_url.clone()),
            timeout_secs: non_empty("SMARTGPT_TIMEOUT_SECS")
                .and_then(|t| t.trim().parse().ok())
                .filter(|t| *t > 0)
                .unwrap_or(api.timeout_secs),
        }
    }
}

/// The two supported model tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Cheap,
    Premium,
}

impl ModelTier {
    pub const ALL: [ModelTier; 2] = [ModelTier::Cheap, ModelTier::Premium];
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelTier::Cheap => f.write_str("cheap"),
            ModelTier::Premium => f.write_str("premium"),
        }
    }
}

/// Number of candidate answers to generate, always within 1..=4
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputCount(u8);

impl OutputCount {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;
    pub const DEFAULT: OutputCount = OutputCount(3);

    pub fn new(count: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&count).then_some(Self(count))
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }

    /// Parse a line typed at the interactive prompt; blank means the default
    pub fn from_prompt_input(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Some(Self::DEFAULT);
        }
        input.parse().ok()
    }
}

impl FromStr for OutputCount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let count: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a number", s.trim()))?;
        Self::new(count).ok_or_else(|| {
            format!(
                "output count must be between {} and {}",
                Self::MIN,
                Self::MAX
            )
        })
    }
}

impl fmt::Display for OutputCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-run pipeline parameters: how many answers and which tier each stage uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub output_count: OutputCount,
    pub fanout_model: ModelTier,
    pub critique_model: ModelTier,
    pub extraction_model: ModelTier,
}

impl PipelineConfig {
    /// Cheap model for every stage but resolution, unless `premium_everywhere`
    pub fn new(output_count: OutputCount, premium_everywhere: bool) -> Self {
        let tier = if premium_everywhere {
            ModelTier::Premium
        } else {
            ModelTier::Cheap
        };

        Self {
            output_count,
            fanout_model: tier,
            critique_model: tier,
            extraction_model: tier,
        }
    }

    /// Resolution always runs on the premium model
    pub fn resolution_model(&self) -> ModelTier {
        ModelTier::Premium
    }
}
