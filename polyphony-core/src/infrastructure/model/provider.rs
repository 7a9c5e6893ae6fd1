//! Dynamic model provider with multiple backends

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use super::factory::ProviderFactory;
use super::traits::{ChunkSink, ModelClient, ModelProvider};
use super::types::{Completion, ModelRequest, ProviderError};
use crate::config::ModelProviderConfig;

/// Runtime container for a provider backend
struct ProviderRuntime {
    models: HashSet<String>,
    client: Box<dyn ModelClient>,
}

impl ProviderRuntime {
    fn supports(&self, model: &str) -> bool {
        self.models.is_empty() || self.models.contains(model)
    }
}

/// Dynamic model provider that routes requests to appropriate backends
#[derive(Default)]
pub struct DynamicModelProvider {
    backends: HashMap<String, ProviderRuntime>,
}

impl DynamicModelProvider {
    /// Create provider from config list using factory
    pub fn from_configs(configs: &[ModelProviderConfig]) -> Self {
        let mut backends = HashMap::new();

        for config in configs {
            let models: HashSet<String> = config.models.iter().cloned().collect();
            let client = ProviderFactory::create(config);
            backends.insert(config.id.clone(), ProviderRuntime { models, client });
        }

        Self { backends }
    }

    /// Check if provider exists
    pub fn contains(&self, provider: &str) -> bool {
        self.backends.contains_key(provider)
    }

    fn runtime(&self, request: &ModelRequest) -> Result<&ProviderRuntime, ProviderError> {
        let runtime = self
            .backends
            .get(&request.provider)
            .ok_or_else(|| ProviderError::provider_not_found(&request.provider))?;

        if !runtime.supports(&request.version) {
            return Err(ProviderError::model_not_supported(
                &request.provider,
                &request.version,
            ));
        }
        Ok(runtime)
    }
}

#[async_trait]
impl ModelProvider for DynamicModelProvider {
    async fn chat(&self, request: ModelRequest) -> Result<Completion, ProviderError> {
        self.runtime(&request)?.client.chat(request).await
    }

    async fn stream_chat(
        &self,
        request: ModelRequest,
        chunks: ChunkSink,
    ) -> Result<(), ProviderError> {
        self.runtime(&request)?.client.stream_chat(request, chunks).await
    }

    fn supports_streaming(&self, provider: &str) -> bool {
        self.backends
            .get(provider)
            .is_none_or(|r| r.client.supports_streaming())
    }
}
