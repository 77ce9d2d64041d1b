//! OpenAI-compatible provider
//!
//! Works with any API that implements the OpenAI chat completions format:
//! - OpenAI (api.openai.com)
//! - Groq (api.groq.com)
//! - vLLM, LM Studio, LocalAI (local servers)
//!
//! # Configuration
//!
//! ```toml
//! [api]
//! base_url = "https://api.openai.com/v1"  # or Groq, vLLM, etc.
//! timeout_secs = 120
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::conversation::Message;

use super::{Completion, CompletionProvider, ProviderError};

/// OpenAI-compatible chat message
#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

/// Error response from API
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// OpenAI-compatible provider configuration
#[derive(Debug, Clone)]
pub struct OpenAICompatConfig {
    /// Base URL for the API (e.g., https://api.openai.com/v1)
    pub base_url: String,
    /// API key (optional for local servers)
    pub api_key: Option<String>,
    /// Optional organization ID (OpenAI)
    pub organization: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAICompatConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            organization: None,
            timeout_secs: 120,
        }
    }
}

impl OpenAICompatConfig {
    /// Create config for OpenAI
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }
}

/// OpenAI-compatible API provider
pub struct OpenAICompatProvider {
    config: OpenAICompatConfig,
    client: Client,
}

impl OpenAICompatProvider {
    /// Create a new provider with the given configuration
    pub fn new(config: OpenAICompatConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionProvider for OpenAICompatProvider {
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        temperature: f32,
    ) -> Result<Completion, ProviderError> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            temperature,
        };

        let mut req_builder = self.client.post(self.endpoint());

        // Add authorization if API key is provided
        if let Some(ref api_key) = self.config.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        // Add organization header if provided (OpenAI specific)
        if let Some(ref org) = self.config.organization {
            req_builder = req_builder.header("OpenAI-Organization", org);
        }

        debug!(model, temperature, turns = messages.len(), "Sending chat completion");

        let response = req_builder.json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;

        parse_response(status, &body)
    }
}

/// Turn an HTTP status and body into a completion or a named error
fn parse_response(status: StatusCode, body: &str) -> Result<Completion, ProviderError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());

        return Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthorized(message),
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderError::Timeout,
            _ => ProviderError::Api {
                status: status.as_u16(),
                message,
            },
        });
    }

    let completion: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::InvalidResponse(format!("Failed to parse response: {} - Body: {}", e, body))
    })?;

    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))?;

    let text = match choice.message.content {
        Some(content) => content,
        None => {
            warn!("Completion returned no content, treating as empty");
            String::new()
        }
    };

    Ok(Completion {
        text,
        total_tokens: completion.usage.map(|u| u.total_tokens).unwrap_or(0),
    })
}
