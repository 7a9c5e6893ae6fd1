//! Chat proxy client implementation
//!
//! Talks to the product's own chat endpoint: a JSON POST that answers with a
//! stream of newline-delimited JSON objects, each optionally carrying a
//! `content` field with the next text fragment. Stream end signals
//! completion.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::base::HttpClientBase;
use super::lines::for_each_line;
use crate::config::ModelProviderConfig;
use crate::infrastructure::model::adapter::MessageAdapter;
use crate::infrastructure::model::factory::resolve_api_key;
use crate::infrastructure::model::traits::{ChunkSink, ModelClient};
use crate::infrastructure::model::types::{Completion, ModelRequest, ProviderError};

/// Client for the `/api/chat` proxy endpoint
#[derive(Clone)]
pub struct ApiChatClient {
    base: HttpClientBase,
    api_path: String,
}

impl ApiChatClient {
    pub fn from_config(config: &ModelProviderConfig) -> Self {
        let api_key = resolve_api_key(&config.id, config.api_key.as_deref());
        Self {
            base: HttpClientBase::new(config.id.clone(), config.endpoint.clone(), api_key),
            api_path: config
                .api_path
                .clone()
                .unwrap_or_else(|| "/api/chat".to_string()),
        }
    }
}

#[async_trait]
impl ModelClient for ApiChatClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn chat(&self, request: ModelRequest) -> Result<Completion, ProviderError> {
        // The proxy only speaks the streaming shape; a full completion is
        // the stream drained to the end.
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.stream_chat(request, tx).await?;

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
        let url = self.base.build_url(&self.api_path);
        let payload = MessageAdapter::to_proxy_payload(
            &request.messages,
            &request.model,
            &request.version,
            &request.options,
        );

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            version = request.version.as_str(),
            messages = request.messages.len(),
            "Opening stream to chat proxy"
        );

        let bearer = self.base.api_key.is_some();
        let response = self.base.post_streaming(&url, &payload, bearer).await?;
        for_each_line(&self.base.id, response, |line| {
            match serde_json::from_str::<ProxyFragment>(line) {
                Ok(fragment) => {
                    if let Some(text) = fragment.content
                        && !text.is_empty()
                    {
                        let _ = chunks.send(text);
                    }
                }
                // A fragment with no parseable content is ignored, not fatal.
                Err(err) => debug!(provider = self.base.id.as_str(), %err, "skipping stream fragment"),
            }
        })
        .await
    }
}

#[derive(Deserialize)]
struct ProxyFragment {
    content: Option<String>,
}
