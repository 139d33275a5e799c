//! Chat exchange types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a chat exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    /// Message typed by the end user
    User,
    /// Reply shown by the assistant (remote model or fallback)
    Bot,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Bot => "bot",
        }
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single message in a chat session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatExchange {
    /// Author of the message
    pub role: ChatRole,
    /// Message text
    pub text: String,
    /// When the message was appended
    pub timestamp: DateTime<Utc>,
}

impl ChatExchange {
    /// Create a new exchange stamped with the current time
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user exchange
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, text)
    }

    /// Create a bot exchange
    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Bot, text)
    }
}
