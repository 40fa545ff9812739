//! Ordered, append-only conversation log with optional persistence.

use tracing::{debug, warn};

use crate::constants::HISTORY_KEY;
use crate::message::Message;
use crate::storage::HistoryStorage;

#[derive(Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    storage: Option<Box<dyn HistoryStorage>>,
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("messages", &self.messages)
            .field("persistent", &self.storage.is_some())
            .finish()
    }
}

impl ConversationStore {
    /// In-memory store; nothing survives the process.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store backed by `storage`, rehydrated from whatever was persisted.
    pub fn with_storage(storage: Box<dyn HistoryStorage>) -> Self {
        let mut store = Self {
            messages: Vec::new(),
            storage: Some(storage),
        };
        store.restore();
        store
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
        self.persist();
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        if let Some(storage) = self.storage.as_mut() {
            if let Err(e) = storage.remove(HISTORY_KEY) {
                warn!(error = %e, "Failed to erase persisted conversation");
            }
        }
    }

    /// Writes the whole conversation to storage. Failures are logged only.
    pub fn persist(&mut self) {
        let Some(storage) = self.storage.as_mut() else {
            return;
        };
        let json = match serde_json::to_string(&self.messages) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize conversation");
                return;
            }
        };
        if let Err(e) = storage.set(HISTORY_KEY, &json) {
            warn!(error = %e, "Failed to persist conversation");
        }
    }

    /// Replaces the in-memory log with the persisted one. Missing or
    /// corrupt data leaves the conversation empty; a storage read error
    /// keeps the current log. No-op without storage.
    pub fn restore(&mut self) {
        let Some(storage) = self.storage.as_ref() else {
            return;
        };
        let raw = match storage.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.messages.clear();
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted conversation; keeping current one");
                return;
            }
        };
        match serde_json::from_str::<Vec<Message>>(&raw) {
            Ok(messages) => {
                debug!(count = messages.len(), "Restored conversation");
                self.messages = messages;
            }
            Err(e) => {
                warn!(error = %e, "Discarding corrupt persisted conversation");
                self.messages.clear();
            }
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }

    pub(crate) fn storage(&self) -> Option<&dyn HistoryStorage> {
        self.storage.as_deref()
    }

    pub(crate) fn storage_mut(&mut self) -> Option<&mut (dyn HistoryStorage + 'static)> {
        self.storage.as_deref_mut()
    }
}
