//! Conversation state store.
//!
//! One conversation per selected model, keyed by model id. Every mutation
//! tolerates an absent key silently: a fan-out task may resolve after its
//! model was deselected, and those late writes are dropped rather than
//! treated as errors. There is deliberately no cancellation of in-flight
//! requests on deselect.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;
use uuid::Uuid;

use crate::domain::types::{ChatMessage, Message, MessageRole};

/// Per-model chat state.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub model_id: String,
    pub messages: Vec<Message>,
    pub is_loading: bool,
}

impl Conversation {
    fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            messages: Vec::new(),
            is_loading: false,
        }
    }
}

/// Keyed conversation map shared across fan-out tasks.
///
/// The interior mutex supplies the per-key mutual exclusion the original
/// single-threaded scheduler never needed; no lock is held across an await.
#[derive(Debug, Default)]
pub struct ConversationStore {
    inner: Mutex<HashMap<String, Conversation>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Conversation>> {
        self.inner.lock().expect("conversation store poisoned")
    }

    /// Idempotent: creates an empty conversation if absent, otherwise leaves
    /// the existing one untouched.
    pub fn ensure(&self, model_id: &str) {
        self.lock()
            .entry(model_id.to_string())
            .or_insert_with(|| Conversation::new(model_id));
    }

    /// Drops a conversation on deselect. In-flight requests for the model
    /// keep running; their late writes become no-ops.
    pub fn remove(&self, model_id: &str) {
        self.lock().remove(model_id);
    }

    /// Empties every conversation and resets loading flags.
    pub fn clear_all(&self) {
        for conversation in self.lock().values_mut() {
            conversation.messages.clear();
            conversation.is_loading = false;
        }
    }

    /// Appends to the tail of the model's message sequence. Silent no-op
    /// when the model has no conversation.
    pub fn append(&self, model_id: &str, message: Message) {
        let mut map = self.lock();
        match map.get_mut(model_id) {
            Some(conversation) => conversation.messages.push(message),
            None => debug!(model = model_id, "dropping append for absent conversation"),
        }
    }

    /// Replaces the content of the message matching `message_id`. Idempotent
    /// under repeated calls with the same content; silent no-op when the
    /// conversation or the message is gone.
    pub fn update_content(&self, model_id: &str, message_id: Uuid, content: &str) {
        let mut map = self.lock();
        let Some(conversation) = map.get_mut(model_id) else {
            debug!(model = model_id, "dropping update for absent conversation");
            return;
        };
        match conversation.messages.iter_mut().find(|m| m.id == message_id) {
            Some(message) => {
                if message.content != content {
                    message.content = content.to_string();
                }
            }
            None => debug!(
                model = model_id,
                message = %message_id,
                "dropping update for absent message"
            ),
        }
    }

    /// Loading is tracked separately from message content so callers can
    /// distinguish "has partial content but still streaming" from "done".
    pub fn set_loading(&self, model_id: &str, is_loading: bool) {
        if let Some(conversation) = self.lock().get_mut(model_id) {
            conversation.is_loading = is_loading;
        }
    }

    /// Most recent assistant message, if any.
    pub fn latest_assistant_reply(&self, model_id: &str) -> Option<Message> {
        self.lock()
            .get(model_id)?
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
            .cloned()
    }

    /// Snapshot of a conversation's messages.
    pub fn messages(&self, model_id: &str) -> Vec<Message> {
        self.lock()
            .get(model_id)
            .map(|c| c.messages.clone())
            .unwrap_or_default()
    }

    pub fn is_loading(&self, model_id: &str) -> bool {
        self.lock().get(model_id).is_some_and(|c| c.is_loading)
    }

    /// Wire-format view of the message list, for provider requests.
    pub fn history(&self, model_id: &str) -> Vec<ChatMessage> {
        self.lock()
            .get(model_id)
            .map(|c| c.messages.iter().map(Message::to_wire).collect())
            .unwrap_or_default()
    }

    pub fn model_ids(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}
