pub mod adapter;
pub mod clients;
pub mod factory;
pub mod provider;
pub mod traits;
pub mod types;

pub use provider::DynamicModelProvider;
pub use traits::{ChunkSink, ModelClient, ModelProvider};
pub use types::{Completion, ModelRequest, ProviderError, RequestOptions, TokenUsage};
