//! Chat session state
//!
//! History is append-only and ordered. At most one request per session is
//! outstanding; the [`InFlight`] guard releases the slot when dropped, so
//! every exit path of a request frees it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use finlit_core::{AppContext, ChatExchange};
use parking_lot::Mutex;

use crate::ChatError;

pub struct ChatSession {
    id: String,
    history: Mutex<Vec<ChatExchange>>,
    in_flight: AtomicBool,
    /// Where history is persisted, if anywhere
    context: Option<Arc<AppContext>>,
}

impl ChatSession {
    /// Session with volatile history
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history: Mutex::new(Vec::new()),
            in_flight: AtomicBool::new(false),
            context: None,
        }
    }

    /// Session whose history is restored from and saved to `context`
    pub fn with_persistence(id: impl Into<String>, context: Arc<AppContext>) -> Self {
        let id = id.into();
        let history = context.chat_history(&id);
        tracing::debug!(session_id = %id, restored = history.len(), "Chat session opened");
        Self {
            id,
            history: Mutex::new(history),
            in_flight: AtomicBool::new(false),
            context: Some(context),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> Vec<ChatExchange> {
        self.history.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }

    /// The last `n` exchanges, oldest first
    pub fn context_window(&self, n: usize) -> Vec<ChatExchange> {
        let history = self.history.lock();
        let start = history.len().saturating_sub(n);
        history[start..].to_vec()
    }

    /// Claim the session's request slot
    pub fn begin_request(&self) -> Result<InFlight<'_>, ChatError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ChatError::Busy)?;
        Ok(InFlight { session: self })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Append an exchange and persist the history
    pub fn push(&self, exchange: ChatExchange) {
        let mut history = self.history.lock();
        history.push(exchange);
        self.persist(&history);
    }

    pub fn clear(&self) {
        let mut history = self.history.lock();
        history.clear();
        if let Some(context) = &self.context {
            if let Err(e) = context.clear_chat_history(&self.id) {
                tracing::warn!(session_id = %self.id, error = %e, "Failed to clear chat history");
            }
        }
    }

    fn persist(&self, history: &[ChatExchange]) {
        let Some(context) = &self.context else {
            return;
        };
        if let Err(e) = context.save_chat_history(&self.id, history) {
            tracing::warn!(session_id = %self.id, error = %e, "Failed to persist chat history");
        }
    }
}

/// Holds a session's request slot until dropped
#[derive(Debug)]
pub struct InFlight<'a> {
    session: &'a ChatSession,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.session.in_flight.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("len", &self.len())
            .field("busy", &self.is_busy())
            .finish()
    }
}
