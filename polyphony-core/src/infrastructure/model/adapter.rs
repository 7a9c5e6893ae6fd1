//! Message adapters - convert between different API formats

use serde_json::{Value, json};

use crate::domain::types::ChatMessage;

use super::types::RequestOptions;

/// Adapter for converting messages to different API formats
pub struct MessageAdapter;

impl MessageAdapter {
    /// Convert messages to OpenAI-style format
    /// Returns: [{"role": "...", "content": "..."}]
    pub fn to_openai_format(messages: &[ChatMessage]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.as_str(),
                    "content": msg.content.clone()
                })
            })
            .collect()
    }

    /// Body for the `/api/chat` proxy endpoint:
    /// `{ messages, options: { model, version, temperature, maxTokens } }`
    pub fn to_proxy_payload(
        messages: &[ChatMessage],
        model: &str,
        version: &str,
        options: &RequestOptions,
    ) -> Value {
        json!({
            "messages": Self::to_openai_format(messages),
            "options": {
                "model": model,
                "version": version,
                "temperature": options.temperature,
                "maxTokens": options.max_tokens,
            }
        })
    }
}
