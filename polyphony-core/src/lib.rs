//! Multi-model chat orchestration core.
//!
//! One prompt fans out to every selected model concurrently, streamed
//! replies accumulate into a shared conversation store, and an optional
//! synthesis pass merges the completed replies into a single consolidated
//! answer, all under remote-backed usage quotas.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod registry;

pub use application::orchestrator::{
    DispatchError, MODEL_ERROR_REPLY, Orchestrator, VersionSelection,
};
pub use application::store::{Conversation, ConversationStore};
pub use application::synthesis::{
    SYNTHESIS_INSTRUCTION, SynthesisEngine, SynthesisError, SynthesisResult, SynthesisTarget,
};
pub use application::usage::{
    LocalUsageLedger, UsageBackend, UsageError, UsageLimits, UsageSnapshot, UsageTracker,
};
pub use config::{AppConfig, ConfigError, ModelProviderConfig};
pub use domain::types::{ChatMessage, Message, MessageRole};
pub use infrastructure::model::{
    ChunkSink, Completion, DynamicModelProvider, ModelClient, ModelProvider, ModelRequest,
    ProviderError, RequestOptions, TokenUsage,
};
pub use infrastructure::usage::HttpUsageBackend;
pub use registry::{Model, ModelRegistry, ModelVersion, ProviderKey, RegistryError};
