//! # Provider Configuration
//!
//! Configuration types for AI model provider backends. A provider entry
//! describes one HTTP endpoint plus the vendor model strings it serves.
//!
//! ## Provider Types
//!
//! | Type | Description | API Key Required |
//! |------|-------------|-----------------|
//! | `openai` | OpenAI-compatible APIs (OpenAI, DeepInfra) | Yes |
//! | `grok` | xAI single-prompt API | Yes |
//! | `api` | The product's own `/api/chat` proxy | Optional |

use serde::{Deserialize, Serialize};

/// Configuration for an AI model provider backend.
///
/// # Example
///
/// ```toml
/// [[providers]]
/// id = "openai"
/// type = "openai"
/// endpoint = "https://api.openai.com"
/// api_key = "OPENAI_API_KEY"
/// models = ["gpt-4o", "gpt-4o-mini"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelProviderConfig {
    /// Unique identifier for this provider (e.g., "openai", "deepinfra")
    pub id: String,
    /// The provider type determines API format: "openai", "grok", "api"
    #[serde(rename = "type")]
    pub provider_type: String,
    /// API endpoint URL
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom API path override (e.g., "/v1/chat/completions")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_path: Option<String>,
    /// Vendor model strings served by this provider; empty means any
    #[serde(default)]
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct RawProviderConfig {
    pub(super) id: String,
    #[serde(rename = "type", default)]
    pub(super) provider_type: String,
    pub(super) endpoint: Option<String>,
    pub(super) api_key: Option<String>,
    #[serde(default)]
    pub(super) api_path: Option<String>,
    #[serde(default)]
    pub(super) models: Vec<String>,
}

impl From<RawProviderConfig> for ModelProviderConfig {
    fn from(raw: RawProviderConfig) -> Self {
        Self {
            id: raw.id,
            provider_type: raw.provider_type,
            endpoint: raw.endpoint.unwrap_or_default(),
            api_key: raw.api_key,
            api_path: raw.api_path,
            models: raw.models,
        }
    }
}

impl ModelProviderConfig {
    /// Check if this provider routes through the chat proxy (case-insensitive).
    pub fn is_proxy(&self) -> bool {
        self.provider_type.eq_ignore_ascii_case("api")
            || self.provider_type.eq_ignore_ascii_case("proxy")
    }

    /// Check if this is a Grok provider (case-insensitive).
    pub fn is_grok(&self) -> bool {
        self.provider_type.eq_ignore_ascii_case("grok")
            || self.provider_type.eq_ignore_ascii_case("xai")
    }
}
