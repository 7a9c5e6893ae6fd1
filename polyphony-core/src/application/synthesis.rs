//! Response synthesis engine.
//!
//! Second-pass aggregation: the latest completed reply from each selected
//! model is embedded into one meta-prompt and sent to a designated
//! synthesis backend, producing a single consolidated answer. One request
//! at a time; the stored result only changes on success.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::application::store::ConversationStore;
use crate::application::usage::{UsageBackend, UsageTracker};
use crate::domain::types::ChatMessage;
use crate::infrastructure::model::{ModelProvider, ModelRequest, ProviderError, RequestOptions};
use crate::registry::ModelRegistry;

/// Fixed system instruction for the synthesis pass.
pub const SYNTHESIS_INSTRUCTION: &str = "You are a synthesis assistant. Merge the \
model responses you are given into one consolidated answer: combine their \
insights, eliminate redundancy, preserve each model's unique perspective, and \
explicitly call out points where the models disagree. Format the answer using \
bold section titles and '-' bullet markers only; never use markdown headings.";

/// The designated synthesis backend. Deliberately a fixed default, never one
/// of the user's selected models.
#[derive(Debug, Clone)]
pub struct SynthesisTarget {
    /// Provider adapter id
    pub provider: String,
    /// Vendor model string
    pub model: String,
}

/// Consolidated answer plus the display names of the models it merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisResult {
    pub content: String,
    pub source_model_names: Vec<String>,
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("a synthesis request is already in flight")]
    Busy,
    #[error("synthesis limit of {limit} reached")]
    QuotaExceeded { limit: u32 },
    #[error("synthesis needs at least two completed replies, found {available}")]
    InsufficientResponses { available: usize },
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("synthesis stream aborted: {0}")]
    Aborted(String),
}

impl SynthesisError {
    /// User-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            SynthesisError::Busy => {
                "A synthesis is already running. Wait for it to finish.".to_string()
            }
            SynthesisError::QuotaExceeded { limit } => {
                format!("You have reached your synthesis limit of {limit}. Upgrade to continue.")
            }
            SynthesisError::InsufficientResponses { .. } => {
                "Synthesis needs completed responses from at least two models.".to_string()
            }
            SynthesisError::Provider(err) => err.user_message(),
            SynthesisError::Aborted(_) => {
                "Synthesis was interrupted. Please try again.".to_string()
            }
        }
    }
}

/// Merges completed model replies into one answer through a fixed backend.
pub struct SynthesisEngine<P, B> {
    registry: Arc<ModelRegistry>,
    store: Arc<ConversationStore>,
    provider: Arc<P>,
    usage: Arc<UsageTracker<B>>,
    target: SynthesisTarget,
    options: RequestOptions,
    result: Mutex<Option<SynthesisResult>>,
    in_flight: AtomicBool,
}

impl<P, B> SynthesisEngine<P, B>
where
    P: ModelProvider + 'static,
    B: UsageBackend + 'static,
{
    pub fn new(
        registry: Arc<ModelRegistry>,
        store: Arc<ConversationStore>,
        provider: Arc<P>,
        usage: Arc<UsageTracker<B>>,
        target: SynthesisTarget,
    ) -> Self {
        Self {
            registry,
            store,
            provider,
            usage,
            target,
            options: RequestOptions::default(),
            result: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// The current consolidated answer, if one has been produced.
    pub fn result(&self) -> Option<SynthesisResult> {
        self.result.lock().expect("synthesis slot poisoned").clone()
    }

    /// Clears the stored result (explicit dismissal).
    pub fn dismiss(&self) {
        *self.result.lock().expect("synthesis slot poisoned") = None;
    }

    /// Merges the latest replies of `targets` into one answer.
    ///
    /// Rejected while another synthesis is outstanding ("busy", not
    /// queued), so the quota can never be double-counted and the stored
    /// result never sees overlapping writes.
    pub async fn synthesize(&self, targets: &[String]) -> Result<(), SynthesisError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(SynthesisError::Busy);
        }
        let outcome = self.run(targets).await;
        self.in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    async fn run(&self, targets: &[String]) -> Result<(), SynthesisError> {
        if !self.usage.synthesis_budget_allows() {
            return Err(SynthesisError::QuotaExceeded {
                limit: self.usage.limits().synthesize_limit,
            });
        }

        // A model qualifies when its latest assistant reply exists and is
        // non-empty; an empty reply is a still-streaming placeholder.
        let mut sources: Vec<(String, String)> = Vec::new();
        for model_id in targets {
            let Some(reply) = self.store.latest_assistant_reply(model_id) else {
                continue;
            };
            if reply.content.trim().is_empty() {
                continue;
            }
            let name = self
                .registry
                .display_name(model_id)
                .unwrap_or(model_id)
                .to_string();
            sources.push((name, reply.content));
        }

        if sources.len() < 2 {
            return Err(SynthesisError::InsufficientResponses {
                available: sources.len(),
            });
        }

        info!(
            sources = sources.len(),
            provider = self.target.provider.as_str(),
            model = self.target.model.as_str(),
            "Requesting synthesis"
        );

        let request = ModelRequest {
            provider: self.target.provider.clone(),
            model: self.target.model.clone(),
            version: self.target.model.clone(),
            messages: vec![
                ChatMessage::system(SYNTHESIS_INSTRUCTION),
                ChatMessage::user(build_synthesis_listing(&sources)),
            ],
            options: self.options.clone(),
        };

        let content = if self.provider.supports_streaming(&self.target.provider) {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let provider = self.provider.clone();
            let stream = tokio::spawn(async move { provider.stream_chat(request, tx).await });

            let mut content = String::new();
            while let Some(fragment) = rx.recv().await {
                content.push_str(&fragment);
            }
            match stream.await {
                Ok(outcome) => outcome?,
                Err(err) => return Err(SynthesisError::Aborted(err.to_string())),
            }
            content
        } else {
            self.provider.chat(request).await?.content
        };

        debug!(chars = content.len(), "Synthesis completed");

        let names = sources.into_iter().map(|(name, _)| name).collect();
        *self.result.lock().expect("synthesis slot poisoned") = Some(SynthesisResult {
            content,
            source_model_names: names,
        });
        self.usage.record_synthesis().await;
        Ok(())
    }
}

/// User-turn body: each model's display name as a heading, its reply below.
fn build_synthesis_listing(sources: &[(String, String)]) -> String {
    let mut listing = String::from(
        "Here are the responses from the individual models. Synthesize them.\n",
    );
    for (name, content) in sources {
        listing.push_str("\n**");
        listing.push_str(name);
        listing.push_str("**\n");
        listing.push_str(content);
        listing.push('\n');
    }
    listing
}
