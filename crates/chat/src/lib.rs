//! Chat assistant
//!
//! Features:
//! - Per-session history with a single request in flight
//! - Remote model call under the chat retry policy
//! - Keyword fallback replies whenever the remote path fails
//! - Optional history persistence through the application context

pub mod fallback;
pub mod service;
pub mod session;

pub use fallback::{FallbackRule, FallbackRules, ShadowedRule};
pub use service::{ChatReply, ChatService, ReplySource};
pub use session::{ChatSession, InFlight};

use thiserror::Error;

/// Chat errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Message too long: {0} > {1} characters")]
    MessageTooLong(usize, usize),

    #[error("A request is already in flight for this session")]
    Busy,

    #[error("Invalid fallback rules: {0}")]
    Rules(String),
}

impl From<ChatError> for finlit_core::Error {
    fn from(err: ChatError) -> Self {
        finlit_core::Error::Chat(err.to_string())
    }
}
