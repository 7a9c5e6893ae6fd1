//! Shared test doubles: a scripted model provider and a pre-wired harness.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use polyphony_core::{
    ChunkSink, Completion, ConversationStore, LocalUsageLedger, Model, ModelProvider,
    ModelRegistry, ModelRequest, ModelVersion, Orchestrator, ProviderError, SynthesisEngine,
    SynthesisTarget, UsageLimits, UsageTracker,
};

/// Scripted behaviour for one model key.
#[derive(Clone)]
pub enum Script {
    /// Stream these fragments, then succeed.
    Chunks(Vec<&'static str>),
    /// Stream these fragments slowly, then succeed.
    SlowChunks(Vec<&'static str>, Duration),
    /// Fail without producing anything.
    Fail,
    /// Full completion for the non-streaming path.
    Full(&'static str),
}

/// Provider double keyed by the request's model field.
pub struct MockProvider {
    scripts: Mutex<HashMap<String, Script>>,
    calls: AtomicUsize,
    streaming: bool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            streaming: true,
        }
    }

    pub fn non_streaming() -> Self {
        Self {
            streaming: false,
            ..Self::new()
        }
    }

    pub fn script(self, model: &str, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(model.to_string(), script);
        self
    }

    /// Number of chat/stream calls that reached the provider.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn script_for(&self, model: &str) -> Option<Script> {
        self.scripts.lock().unwrap().get(model).cloned()
    }

    fn scripted_failure() -> ProviderError {
        ProviderError::invalid_response("mock", "scripted failure")
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    async fn chat(&self, request: ModelRequest) -> Result<Completion, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script_for(&request.model) {
            Some(Script::Full(text)) => Ok(Completion::new(text)),
            Some(Script::Chunks(parts)) | Some(Script::SlowChunks(parts, _)) => {
                Ok(Completion::new(parts.concat()))
            }
            Some(Script::Fail) | None => Err(Self::scripted_failure()),
        }
    }

    async fn stream_chat(
        &self,
        request: ModelRequest,
        chunks: ChunkSink,
    ) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script_for(&request.model) {
            Some(Script::Chunks(parts)) => {
                for part in parts {
                    let _ = chunks.send(part.to_string());
                }
                Ok(())
            }
            Some(Script::SlowChunks(parts, delay)) => {
                for part in parts {
                    tokio::time::sleep(delay).await;
                    let _ = chunks.send(part.to_string());
                }
                Ok(())
            }
            Some(Script::Full(text)) => {
                let _ = chunks.send(text.to_string());
                Ok(())
            }
            Some(Script::Fail) | None => Err(Self::scripted_failure()),
        }
    }

    fn supports_streaming(&self, _provider: &str) -> bool {
        self.streaming
    }
}

fn model(id: &str, name: &str, available: bool) -> Model {
    Model {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        icon: String::new(),
        capabilities: vec!["chat".to_string()],
        versions: vec![ModelVersion {
            id: format!("{id}-v1"),
            name: format!("{name} v1"),
            description: String::new(),
            provider: "mock".to_string(),
            provider_key: None,
            available,
        }],
    }
}

/// Catalog with two live models and one gated one, all routed to "mock".
pub fn test_registry() -> ModelRegistry {
    ModelRegistry::new(vec![
        model("chatgpt", "ChatGPT", true),
        model("claude", "Claude", true),
        model("gemini", "Gemini", false),
    ])
}

/// Pre-wired orchestrator + synthesis engine over the mock provider.
pub struct Harness {
    pub store: Arc<ConversationStore>,
    pub provider: Arc<MockProvider>,
    pub usage: Arc<UsageTracker<LocalUsageLedger>>,
    pub orchestrator: Orchestrator<MockProvider, LocalUsageLedger>,
    pub synthesis: SynthesisEngine<MockProvider, LocalUsageLedger>,
}

impl Harness {
    pub fn new(provider: MockProvider, limits: UsageLimits) -> Self {
        let registry = Arc::new(test_registry());
        let store = Arc::new(ConversationStore::new());
        let provider = Arc::new(provider);
        let usage = Arc::new(UsageTracker::new(LocalUsageLedger::new(), "tester", limits));

        let orchestrator = Orchestrator::new(
            registry.clone(),
            store.clone(),
            provider.clone(),
            usage.clone(),
        );
        let synthesis = SynthesisEngine::new(
            registry,
            store.clone(),
            provider.clone(),
            usage.clone(),
            SynthesisTarget {
                provider: "mock".to_string(),
                model: "synthesizer".to_string(),
            },
        );

        Self {
            store,
            provider,
            usage,
            orchestrator,
            synthesis,
        }
    }

    pub fn with_defaults(provider: MockProvider) -> Self {
        Self::new(provider, UsageLimits::default())
    }

    /// Selects the given models, creating backing conversations.
    pub fn select(&self, models: &[&str]) -> Vec<String> {
        for id in models {
            self.store.ensure(id);
        }
        models.iter().map(|id| id.to_string()).collect()
    }
}
