//! Chat-completion provider integrations

mod openai_compat;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;
use crate::conversation::Message;

pub use openai_compat::{OpenAICompatConfig, OpenAICompatProvider};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Network(err)
        }
    }
}

/// Result of a single completion call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// First choice's content, empty when the API returned none
    pub text: String,
    /// `usage.total_tokens`, 0 when unreported
    pub total_tokens: u64,
}

/// A backend that can answer one chat-completion request
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        temperature: f32,
    ) -> Result<Completion, ProviderError>;
}

/// Build the provider described by the environment configuration
pub fn from_config(config: &Config) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
    let api_key = config
        .openai_api_key
        .clone()
        .ok_or_else(|| ProviderError::NotConfigured("OPENAI_API_KEY is not set".into()))?;

    let provider_config = OpenAICompatConfig {
        base_url: config.openai_base_url.clone(),
        organization: config.openai_organization.clone(),
        timeout_secs: config.timeout_secs,
        ..OpenAICompatConfig::openai(api_key)
    };

    Ok(Arc::new(OpenAICompatProvider::new(provider_config)?))
}
