//! Fan-out orchestrator.
//!
//! One user prompt, N selected models: each target gets its own spawned
//! task driving one provider request, and every task reports into the
//! shared [`ConversationStore`] instead of returning anything. Failures are
//! absorbed at the task boundary and rendered as a fixed assistant error
//! message; one model going down never touches its siblings. `dispatch`
//! resolves once every task has terminated.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::application::store::ConversationStore;
use crate::application::stream::drain_throttled;
use crate::application::usage::{UsageBackend, UsageTracker};
use crate::domain::types::Message;
use crate::infrastructure::model::{ModelProvider, ModelRequest, RequestOptions};
use crate::registry::{ModelRegistry, ProviderKey, RegistryError};

/// Explicit version choices, keyed by model id. Models without an entry use
/// the registry's default version.
pub type VersionSelection = HashMap<String, String>;

/// Fixed reply appended when a model's request fails, whatever the cause.
pub const MODEL_ERROR_REPLY: &str =
    "Sorry, something went wrong while generating this response. Please try again.";

fn unavailable_reply(display_name: &str) -> String {
    format!(
        "{display_name} is not available yet. This is a placeholder reply; \
         live responses will appear here once the model launches."
    )
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("dispatching {requested} prompts would exceed the limit ({used}/{limit} used)")]
    QuotaExceeded {
        requested: u32,
        used: u32,
        limit: u32,
    },
}

impl DispatchError {
    /// User-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            DispatchError::EmptyPrompt => "Type a message before sending.".to_string(),
            DispatchError::QuotaExceeded { limit, .. } => {
                format!("You have reached your prompt limit of {limit}. Upgrade to continue.")
            }
        }
    }
}

/// Per-model failure, absorbed inside the task that produced it.
#[derive(Debug, Error)]
enum TaskError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Provider(#[from] crate::infrastructure::model::ProviderError),
    #[error("stream task aborted: {0}")]
    Aborted(String),
}

/// Fans one prompt out to every selected model.
pub struct Orchestrator<P, B> {
    registry: Arc<ModelRegistry>,
    store: Arc<ConversationStore>,
    provider: Arc<P>,
    usage: Arc<UsageTracker<B>>,
    options: RequestOptions,
}

impl<P, B> Orchestrator<P, B>
where
    P: ModelProvider + 'static,
    B: UsageBackend + 'static,
{
    pub fn new(
        registry: Arc<ModelRegistry>,
        store: Arc<ConversationStore>,
        provider: Arc<P>,
        usage: Arc<UsageTracker<B>>,
    ) -> Self {
        Self {
            registry,
            store,
            provider,
            usage,
            options: RequestOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Sends `user_text` to every model in `targets` concurrently.
    ///
    /// Resolves after every per-model request has terminated, successfully
    /// or not. Per-model failures land in conversation state, never here;
    /// the only errors surfaced to the caller are the batch-level
    /// preconditions (empty prompt, quota).
    pub async fn dispatch(
        &self,
        user_text: &str,
        targets: &[String],
        versions: &VersionSelection,
    ) -> Result<(), DispatchError> {
        let text = user_text.trim();
        if text.is_empty() {
            return Err(DispatchError::EmptyPrompt);
        }
        if targets.is_empty() {
            debug!("dispatch with no targets is a no-op");
            return Ok(());
        }

        // All-or-nothing at the batch level: either every target fits under
        // the ceiling or nothing is sent.
        let requested = targets.len() as u32;
        if !self.usage.prompt_budget_allows(requested) {
            let snapshot = self.usage.cached();
            return Err(DispatchError::QuotaExceeded {
                requested,
                used: snapshot.prompt_count,
                limit: self.usage.limits().llm_prompt_limit,
            });
        }

        info!(targets = targets.len(), "Dispatching prompt to selected models");

        let user_message = Message::user(text);
        for model_id in targets {
            self.store.append(model_id, user_message.clone());
            self.store.set_loading(model_id, true);
        }

        let mut tasks = Vec::with_capacity(targets.len());
        for model_id in targets {
            tasks.push(tokio::spawn(run_model_task(
                self.registry.clone(),
                self.store.clone(),
                self.provider.clone(),
                model_id.clone(),
                versions.get(model_id).cloned(),
                self.options.clone(),
            )));
        }
        for task in tasks {
            if let Err(err) = task.await {
                error!(%err, "model task aborted unexpectedly");
            }
        }

        // A slot is spent per attempted model, failures included; the
        // server's reply refreshes the cached counters.
        self.usage.record_prompts(requested).await;
        Ok(())
    }
}

/// Drives one model's request and absorbs whatever goes wrong.
///
/// The loading flag is cleared as the unconditional final step.
async fn run_model_task<P: ModelProvider + 'static>(
    registry: Arc<ModelRegistry>,
    store: Arc<ConversationStore>,
    provider: Arc<P>,
    model_id: String,
    version_id: Option<String>,
    options: RequestOptions,
) {
    let outcome = drive_model(
        &registry,
        &store,
        provider,
        &model_id,
        version_id,
        options,
    )
    .await;

    if let Err(err) = outcome {
        warn!(model = model_id.as_str(), %err, "model request failed");
        store.append(&model_id, Message::assistant(MODEL_ERROR_REPLY));
    }
    store.set_loading(&model_id, false);
}

async fn drive_model<P: ModelProvider + 'static>(
    registry: &ModelRegistry,
    store: &ConversationStore,
    provider: Arc<P>,
    model_id: &str,
    version_id: Option<String>,
    options: RequestOptions,
) -> Result<(), TaskError> {
    let version_id = match version_id {
        Some(id) => id,
        None => registry.default_version(model_id)?.id.clone(),
    };
    let version = registry.resolve_version(model_id, &version_id)?;

    let key = match registry.provider_key(model_id, &version_id)? {
        ProviderKey::Unavailable => {
            // Gated version: canned reply, no network.
            let name = registry.display_name(model_id).unwrap_or(model_id);
            debug!(model = model_id, version = version_id.as_str(), "version gated, substituting stub");
            store.append(model_id, Message::assistant(unavailable_reply(name)));
            return Ok(());
        }
        ProviderKey::Available(key) => key,
    };

    let history = store.history(model_id);
    let placeholder = Message::assistant_placeholder();
    let placeholder_id = placeholder.id;
    store.append(model_id, placeholder);

    let request = ModelRequest {
        provider: version.provider.clone(),
        model: model_id.to_string(),
        version: key,
        messages: history,
        options,
    };

    if provider.supports_streaming(&version.provider) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stream_provider = provider.clone();
        let stream = tokio::spawn(async move { stream_provider.stream_chat(request, tx).await });

        // Throttled intermediate flushes plus an unconditional final one:
        // the placeholder always ends up holding the full accumulated text.
        drain_throttled(rx, |text| {
            store.update_content(model_id, placeholder_id, text);
        })
        .await;

        match stream.await {
            Ok(outcome) => outcome?,
            Err(err) => return Err(TaskError::Aborted(err.to_string())),
        }
    } else {
        let completion = provider.chat(request).await?;
        store.update_content(model_id, placeholder_id, &completion.content);
    }
    Ok(())
}
