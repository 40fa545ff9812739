//! Drives one send cycle: validate, record, ask the gateway, record the answer.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::constants::{DEFAULT_REQUEST_TIMEOUT, FALLBACK_REPLY};
use crate::formatter::format_response;
use crate::gateway::{CompletionGateway, GatewayError};
use crate::message::Message;
use crate::session::{Rejection, Session, Theme};

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Upper bound on a single gateway call; expiry counts as a failure.
    pub timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The gateway answered and the formatted reply was recorded.
    Completed,
    /// The gateway failed and the fallback reply was recorded.
    Failed,
    /// Nothing happened.
    Rejected(Rejection),
}

/// Shared handle to a session and the gateway it talks to. Cloning is cheap
/// and every clone observes the same conversation and busy flag.
#[derive(Clone)]
pub struct ConversationController {
    session: Arc<Mutex<Session>>,
    gateway: Arc<dyn CompletionGateway>,
    config: ControllerConfig,
}

fn lock_session(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clears the busy flag when dropped, including when the send future is
/// dropped before the gateway answers.
struct BusyGuard<'a> {
    session: &'a Mutex<Session>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        lock_session(self.session).finish_send();
    }
}

impl ConversationController {
    pub fn new(session: Session, gateway: Arc<dyn CompletionGateway>) -> Self {
        Self::with_config(session, gateway, ControllerConfig::default())
    }

    pub fn with_config(
        session: Session,
        gateway: Arc<dyn CompletionGateway>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            gateway,
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        lock_session(&self.session)
    }

    /// Submits `raw_input`. The user message is recorded before the gateway
    /// is awaited; gateway errors never escape and always end in exactly one
    /// assistant message.
    #[instrument(skip(self, raw_input), fields(input_len = raw_input.len()))]
    pub async fn send(&self, raw_input: &str) -> SendOutcome {
        let begun = self.lock().begin_send(raw_input);
        if let Err(rejection) = begun {
            debug!(?rejection, "Ignoring submission");
            return SendOutcome::Rejected(rejection);
        }
        let _busy = BusyGuard {
            session: &self.session,
        };

        let result = match tokio::time::timeout(self.config.timeout, self.gateway.complete(raw_input)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.config.timeout)),
        };

        let mut session = self.lock();
        match result {
            Ok(reply) => {
                session.record_reply(format_response(&reply));
                info!(messages = session.messages().len(), "Recorded assistant reply");
                SendOutcome::Completed
            }
            Err(e) => {
                warn!(error = %e, "Completion failed, recording fallback reply");
                session.record_reply(FALLBACK_REPLY);
                SendOutcome::Failed
            }
        }
    }

    /// Clears the conversation. Returns false while a request is in flight.
    pub fn clear(&self) -> bool {
        match self.lock().clear() {
            Ok(()) => {
                info!("Conversation cleared");
                true
            }
            Err(rejection) => {
                debug!(?rejection, "Refusing to clear conversation");
                false
            }
        }
    }

    pub fn toggle_theme(&self) -> Theme {
        self.lock().toggle_theme()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages().to_vec()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().is_busy()
    }

    pub fn theme(&self) -> Theme {
        self.lock().theme()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}
