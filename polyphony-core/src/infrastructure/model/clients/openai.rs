//! OpenAI-compatible client implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::base::HttpClientBase;
use super::lines::for_each_line;
use crate::config::ModelProviderConfig;
use crate::infrastructure::model::adapter::MessageAdapter;
use crate::infrastructure::model::factory::resolve_api_key;
use crate::infrastructure::model::traits::{ChunkSink, ModelClient};
use crate::infrastructure::model::types::{Completion, ModelRequest, ProviderError, TokenUsage};

/// OpenAI-compatible client (works with OpenAI, DeepInfra, Mistral, Groq, etc.)
#[derive(Clone)]
pub struct OpenAIClient {
    base: HttpClientBase,
    api_path: String,
}

impl OpenAIClient {
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

    fn payload(&self, request: &ModelRequest, stream: bool) -> OpenAIRequest {
        OpenAIRequest {
            model: request.version.clone(),
            messages: MessageAdapter::to_openai_format(&request.messages),
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
            stream,
        }
    }
}

#[async_trait]
impl ModelClient for OpenAIClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn chat(&self, request: ModelRequest) -> Result<Completion, ProviderError> {
        let url = self.base.build_url(&self.api_path);
        let payload = self.payload(&request, false);

        info!(
            provider = self.base.id.as_str(),
            model = request.version.as_str(),
            messages = request.messages.len(),
            "Sending request to OpenAI-compatible provider"
        );

        let response: OpenAIResponse = self.base.post_with_bearer(&url, &payload).await?;
        debug!("Received response from OpenAI-compatible provider");

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .map(|m| m.content)
            .ok_or_else(|| ProviderError::invalid_response(&self.base.id, "missing content"))?;

        Ok(Completion {
            content,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            }),
        })
    }

    async fn stream_chat(
        &self,
        request: ModelRequest,
        chunks: ChunkSink,
    ) -> Result<(), ProviderError> {
        let url = self.base.build_url(&self.api_path);
        let payload = self.payload(&request, true);

        info!(
            provider = self.base.id.as_str(),
            model = request.version.as_str(),
            messages = request.messages.len(),
            "Opening stream to OpenAI-compatible provider"
        );

        let response = self.base.post_streaming(&url, &payload, true).await?;
        for_each_line(&self.base.id, response, |line| {
            // SSE framing: "data: {json}" records, terminated by [DONE].
            let Some(data) = line.strip_prefix("data:") else {
                return;
            };
            let data = data.trim();
            if data == "[DONE]" {
                return;
            }
            match serde_json::from_str::<OpenAIStreamChunk>(data) {
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
                // An unparseable fragment is skipped, never fatal.
                Err(err) => debug!(provider = self.base.id.as_str(), %err, "skipping stream fragment"),
            }
        })
        .await
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<serde_json::Value>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: String,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAIStreamChunk {
    choices: Vec<OpenAIStreamChoice>,
}

#[derive(Deserialize)]
struct OpenAIStreamChoice {
    delta: Option<OpenAIDelta>,
}

#[derive(Deserialize)]
struct OpenAIDelta {
    content: Option<String>,
}
