//! Grok client implementation
//!
//! xAI's endpoint is prompt-oriented: it takes the latest user prompt and a
//! version string rather than the full message history, so this client
//! collapses the conversation to its final user turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::base::HttpClientBase;
use super::lines::for_each_line;
use crate::config::ModelProviderConfig;
use crate::infrastructure::model::factory::resolve_api_key;
use crate::infrastructure::model::traits::{ChunkSink, ModelClient};
use crate::infrastructure::model::types::{Completion, ModelRequest, ProviderError};

/// Grok client for xAI
#[derive(Clone)]
pub struct GrokClient {
    base: HttpClientBase,
    api_path: String,
}

impl GrokClient {
    pub fn from_config(config: &ModelProviderConfig) -> Self {
        let api_key = resolve_api_key(&config.id, config.api_key.as_deref());
        Self {
            base: HttpClientBase::new(config.id.clone(), config.endpoint.clone(), api_key),
            api_path: config
                .api_path
                .clone()
                .unwrap_or_else(|| "/v1/chat/completions".to_string()),
        }
    }

    /// Single-prompt streaming request: one user turn, one version string.
    pub async fn single_completion(
        &self,
        prompt: &str,
        chunks: ChunkSink,
        version: &str,
    ) -> Result<(), ProviderError> {
        let url = self.base.build_url(&self.api_path);
        let payload = GrokRequest {
            model: version.to_string(),
            messages: vec![GrokMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            stream: true,
        };

        info!(
            provider = self.base.id.as_str(),
            model = version,
            "Opening stream to Grok"
        );

        let response = self.base.post_streaming(&url, &payload, true).await?;
        for_each_line(&self.base.id, response, |line| {
            let data = line.strip_prefix("data:").map(str::trim).unwrap_or(line);
            if data == "[DONE]" {
                return;
            }
            match serde_json::from_str::<GrokStreamChunk>(data) {
                Ok(chunk) => {
                    if let Some(text) = chunk
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta)
                        .and_then(|d| d.content)
                        && !text.is_empty()
                    {
                        let _ = chunks.send(text);
                    }
                }
                Err(err) => debug!(provider = self.base.id.as_str(), %err, "skipping stream fragment"),
            }
        })
        .await
    }
}

#[async_trait]
impl ModelClient for GrokClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn chat(&self, request: ModelRequest) -> Result<Completion, ProviderError> {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        self.single_completion(request.latest_prompt(), tx, &request.version)
            .await?;

        let mut content = String::new();
        while let Ok(fragment) = rx.try_recv() {
            content.push_str(&fragment);
        }
        Ok(Completion::new(content))
    }

    async fn stream_chat(
        &self,
        request: ModelRequest,
        chunks: ChunkSink,
    ) -> Result<(), ProviderError> {
        self.single_completion(request.latest_prompt(), chunks, &request.version)
            .await
    }
}

#[derive(Serialize)]
struct GrokRequest {
    model: String,
    messages: Vec<GrokMessage>,
    stream: bool,
}

#[derive(Serialize)]
struct GrokMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct GrokStreamChunk {
    choices: Vec<GrokStreamChoice>,
}

#[derive(Deserialize)]
struct GrokStreamChoice {
    delta: Option<GrokDelta>,
}

#[derive(Deserialize)]
struct GrokDelta {
    content: Option<String>,
}
