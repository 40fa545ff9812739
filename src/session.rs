//! Per-session state: the conversation, the busy flag and the theme.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::constants::THEME_KEY;
use crate::message::Message;
use crate::storage::HistoryStorage;
use crate::store::ConversationStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => f.write_str("light"),
            Theme::Dark => f.write_str("dark"),
        }
    }
}

/// Why a submission was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyInput,
    Busy,
}

#[derive(Debug, Default)]
pub struct Session {
    store: ConversationStore,
    busy: bool,
    theme: Theme,
}

impl Session {
    /// Empty, idle session that persists nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Session rehydrated from `storage`; every later mutation is written back.
    pub fn with_storage(storage: Box<dyn HistoryStorage>) -> Self {
        let store = ConversationStore::with_storage(storage);
        let theme = store
            .storage()
            .map(load_theme)
            .unwrap_or_default();
        Self {
            store,
            busy: false,
            theme,
        }
    }

    pub fn messages(&self) -> &[Message] {
        self.store.all()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Idle -> Busy. Records the user's message exactly as typed.
    pub fn begin_send(&mut self, raw_input: &str) -> Result<(), Rejection> {
        if raw_input.trim().is_empty() {
            return Err(Rejection::EmptyInput);
        }
        if self.busy {
            return Err(Rejection::Busy);
        }
        self.busy = true;
        self.store.append(Message::user(raw_input));
        Ok(())
    }

    /// Appends the assistant's answer. Leaves the busy flag to the caller.
    pub fn record_reply(&mut self, content: impl Into<String>) {
        self.store.append(Message::assistant(content));
    }

    /// Busy -> Idle.
    pub fn finish_send(&mut self) {
        self.busy = false;
    }

    /// Clears the conversation. Refused while a request is in flight.
    pub fn clear(&mut self) -> Result<(), Rejection> {
        if self.busy {
            return Err(Rejection::Busy);
        }
        self.store.clear();
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        if let Some(storage) = self.store.storage_mut() {
            save_theme(storage, self.theme);
        }
        self.theme
    }
}

fn load_theme(storage: &dyn HistoryStorage) -> Theme {
    match storage.get(THEME_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring corrupt theme preference");
            Theme::default()
        }),
        Ok(None) => Theme::default(),
        Err(e) => {
            warn!(error = %e, "Failed to read theme preference");
            Theme::default()
        }
    }
}

fn save_theme(storage: &mut (dyn HistoryStorage + 'static), theme: Theme) {
    let result = serde_json::to_string(&theme)
        .map_err(|e| e.to_string())
        .and_then(|json| storage.set(THEME_KEY, &json).map_err(|e| e.to_string()));
    match result {
        Ok(()) => debug!(%theme, "Saved theme preference"),
        Err(e) => warn!(error = %e, "Failed to save theme preference"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::storage::{FileStorage, MemoryStorage};
    use tempfile::TempDir;

    #[test]
    fn test_new_session_is_idle_and_empty() {
        let session = Session::new();
        assert!(!session.is_busy());
        assert!(session.messages().is_empty());
        assert_eq!(session.theme(), Theme::Dark);
    }

    #[test]
    fn test_begin_send_rejects_blank_input() {
        let mut session = Session::new();
        assert_eq!(session.begin_send(""), Err(Rejection::EmptyInput));
        assert_eq!(session.begin_send(" \n\t "), Err(Rejection::EmptyInput));
        assert!(session.messages().is_empty());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_begin_send_keeps_raw_input() {
        let mut session = Session::new();
        session.begin_send("  Hello  ").unwrap();
        assert!(session.is_busy());
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role(), Role::User);
        assert_eq!(session.messages()[0].content(), "  Hello  ");
    }

    #[test]
    fn test_begin_send_rejects_while_busy() {
        let mut session = Session::new();
        session.begin_send("A").unwrap();
        assert_eq!(session.begin_send("B"), Err(Rejection::Busy));
        assert_eq!(session.messages().len(), 1);

        session.record_reply("reply");
        session.finish_send();
        session.begin_send("B").unwrap();
        assert_eq!(session.messages().len(), 3);
    }

    #[test]
    fn test_clear_refused_while_busy() {
        let mut session = Session::new();
        session.begin_send("A").unwrap();
        assert_eq!(session.clear(), Err(Rejection::Busy));
        assert_eq!(session.messages().len(), 1);

        session.finish_send();
        session.clear().unwrap();
        session.clear().unwrap();
        assert!(session.messages().is_empty());
    }

    #[test]
    fn test_theme_toggle_persists() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut session = Session::with_storage(Box::new(FileStorage::new(temp_dir.path())));
            assert_eq!(session.toggle_theme(), Theme::Light);
        }
        let session = Session::with_storage(Box::new(FileStorage::new(temp_dir.path())));
        assert_eq!(session.theme(), Theme::Light);
    }

    #[test]
    fn test_corrupt_theme_falls_back_to_default() {
        let storage = MemoryStorage::new().with_entry(THEME_KEY, "\"purple\"");
        let session = Session::with_storage(Box::new(storage));
        assert_eq!(session.theme(), Theme::Dark);
    }
}
