//! Model traits

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use super::types::{Completion, ModelRequest, ProviderError};

/// Receiving end for streamed text fragments. Senders emit non-empty
/// fragments in generation order and drop the sender when the stream ends.
pub type ChunkSink = UnboundedSender<String>;

/// Trait for individual model clients
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Get the client ID
    fn id(&self) -> &str;

    /// Send a chat request and wait for the full completion
    async fn chat(&self, request: ModelRequest) -> Result<Completion, ProviderError>;

    /// Send a chat request, forwarding text fragments into `chunks` as they
    /// arrive. Resolves once the stream is exhausted; rejects on transport
    /// or provider failure.
    async fn stream_chat(
        &self,
        request: ModelRequest,
        chunks: ChunkSink,
    ) -> Result<(), ProviderError>;

    /// Whether this backend can stream. Non-streaming backends are driven
    /// through a single `chat` round-trip instead.
    fn supports_streaming(&self) -> bool {
        true
    }
}

/// Trait for model provider implementations that route requests to a backend
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn chat(&self, request: ModelRequest) -> Result<Completion, ProviderError>;

    async fn stream_chat(
        &self,
        request: ModelRequest,
        chunks: ChunkSink,
    ) -> Result<(), ProviderError>;

    fn supports_streaming(&self, provider: &str) -> bool {
        let _ = provider;
        true
    }
}
