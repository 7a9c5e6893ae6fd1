//! Model types - Request, Completion, and Error types

use reqwest::StatusCode;
use thiserror::Error;

use crate::domain::types::ChatMessage;

/// Request options forwarded to provider backends.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

/// Model request for LLM chat.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Provider adapter id (routing key)
    pub provider: String,
    /// Model family id (e.g., "chatgpt")
    pub model: String,
    /// Vendor model string handed to the backend (a version's provider key)
    pub version: String,
    pub messages: Vec<ChatMessage>,
    pub options: RequestOptions,
}

impl ModelRequest {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        version: impl Into<String>,
        messages: Vec<ChatMessage>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            version: version.into(),
            messages,
            options: RequestOptions::default(),
        }
    }

    /// Last user turn, for single-prompt backends.
    pub fn latest_prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::domain::types::MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

/// Token accounting reported by some providers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Full (non-streamed) completion from a provider.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

impl Completion {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}

/// Provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider '{provider}' is not configured")]
    ProviderNotFound { provider: String },
    #[error("model '{model}' is not available for provider '{provider}'")]
    ModelNotSupported { provider: String, model: String },
    #[error("provider '{provider}' requires an API key")]
    MissingApiKey { provider: String },
    #[error("network error calling provider '{provider}': {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("provider '{provider}' returned status {status}")]
    Status { provider: String, status: u16 },
    #[error("provider '{provider}' returned no response body")]
    MissingBody { provider: String },
    #[error("provider '{provider}' returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl ProviderError {
    pub fn provider_not_found(provider: impl Into<String>) -> Self {
        Self::ProviderNotFound {
            provider: provider.into(),
        }
    }

    pub fn model_not_supported(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self::ModelNotSupported {
            provider: provider.into(),
            model: model.into(),
        }
    }

    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn network(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            provider: provider.into(),
            source,
        }
    }

    pub fn status(provider: impl Into<String>, status: StatusCode) -> Self {
        Self::Status {
            provider: provider.into(),
            status: status.as_u16(),
        }
    }

    pub fn missing_body(provider: impl Into<String>) -> Self {
        Self::MissingBody {
            provider: provider.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// User-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ProviderError::ProviderNotFound { provider } => {
                format!("Model provider '{provider}' is not configured. Check client.toml.")
            }
            ProviderError::ModelNotSupported { provider, model } => {
                format!("Model '{model}' is not offered by provider '{provider}'.")
            }
            ProviderError::MissingApiKey { provider } => {
                format!("Provider '{provider}' requires an API key.")
            }
            ProviderError::Network { provider, source } => {
                if source.is_connect() {
                    format!("Could not connect to model provider '{provider}'.")
                } else if source.is_timeout() {
                    format!("The request to '{provider}' timed out.")
                } else {
                    format!("Network error while talking to '{provider}'.")
                }
            }
            ProviderError::Status { provider, status } => match StatusCode::from_u16(*status) {
                Ok(StatusCode::SERVICE_UNAVAILABLE) | Ok(StatusCode::BAD_GATEWAY) => {
                    format!("Provider '{provider}' is currently unavailable.")
                }
                Ok(StatusCode::TOO_MANY_REQUESTS) => {
                    format!("Provider '{provider}' is rate limiting requests.")
                }
                _ => format!("Request to '{provider}' failed with status {status}."),
            },
            ProviderError::MissingBody { provider } => {
                format!("Provider '{provider}' sent an empty response.")
            }
            ProviderError::InvalidResponse { provider, .. } => {
                format!("The response from '{provider}' could not be understood.")
            }
        }
    }
}
