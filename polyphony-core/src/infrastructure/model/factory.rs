//! Provider factory - creates clients from config

use std::env;

use tracing::warn;

use super::clients::{ApiChatClient, GrokClient, OpenAIClient};
use super::traits::ModelClient;
use crate::config::ModelProviderConfig;

/// Resolve API key from environment variable
pub fn resolve_api_key(provider: &str, spec: Option<&str>) -> Option<String> {
    let Some(raw) = spec.map(str::trim) else {
        return None;
    };
    if raw.is_empty() {
        return None;
    }
    match env::var(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                provider,
                env_var = raw,
                %err,
                "API key environment variable is not set"
            );
            None
        }
    }
}

/// Factory for creating model clients from provider config.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Creates a model client based on provider type.
    ///
    /// Supported types:
    /// - `grok`, `xai` → Grok single-prompt format
    /// - `api`, `proxy` → chat proxy NDJSON format
    /// - Others → OpenAI-compatible format (default; covers OpenAI and
    ///   DeepInfra)
    pub fn create(config: &ModelProviderConfig) -> Box<dyn ModelClient> {
        match config.provider_type.to_lowercase().as_str() {
            "grok" | "xai" => Box::new(GrokClient::from_config(config)),
            "api" | "proxy" => Box::new(ApiChatClient::from_config(config)),
            _ => Box::new(OpenAIClient::from_config(config)),
        }
    }
}
