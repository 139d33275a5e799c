//! Application context
//!
//! Owns every piece of client-local mutable state (theme, auth token,
//! favorites, chat history). Components receive an `Arc<AppContext>` and
//! never touch the underlying store directly; all writes go through the
//! setters below.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::conversation::ChatExchange;
use crate::storage::KeyValueStore;
use crate::Result;

const THEME_KEY: &str = "theme";
const AUTH_TOKEN_KEY: &str = "auth_token";
const FAVORITES_KEY: &str = "favorites";
const CHAT_HISTORY_PREFIX: &str = "chat_history:";

/// UI theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "system" => Some(Theme::System),
            _ => None,
        }
    }
}

/// Sends the user to the sign-in view
pub trait Navigator: Send + Sync {
    fn redirect_to_sign_in(&self);
}

/// Explicit application context
pub struct AppContext {
    store: Arc<dyn KeyValueStore>,
    /// Bumped every time a new credential is stored
    credential_generation: AtomicU64,
}

impl AppContext {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            credential_generation: AtomicU64::new(0),
        }
    }

    /// Current theme, `System` when unset or unreadable
    pub fn theme(&self) -> Theme {
        self.store
            .get(THEME_KEY)
            .and_then(|raw| Theme::parse(&raw))
            .unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.store.set(THEME_KEY, theme.as_str().to_string())
    }

    /// Cached bearer credential
    pub fn auth_token(&self) -> Option<String> {
        self.store.get(AUTH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Store a new credential (sign-in or refresh)
    pub fn set_auth_token(&self, token: impl Into<String>) -> Result<()> {
        self.store.set(AUTH_TOKEN_KEY, token.into())?;
        self.credential_generation.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Forget the cached credential
    pub fn clear_auth_token(&self) -> Result<()> {
        self.store.remove(AUTH_TOKEN_KEY)
    }

    /// Generation of the stored credential; changes on every `set_auth_token`
    pub fn credential_generation(&self) -> u64 {
        self.credential_generation.load(Ordering::SeqCst)
    }

    /// Favorite calculator ids in insertion order
    pub fn favorites(&self) -> Vec<String> {
        self.read_json(FAVORITES_KEY).unwrap_or_default()
    }

    /// Add or remove a favorite. Returns true when it is now a favorite.
    pub fn toggle_favorite(&self, id: &str) -> Result<bool> {
        let mut favorites = self.favorites();
        let now_favorite = match favorites.iter().position(|f| f == id) {
            Some(index) => {
                favorites.remove(index);
                false
            },
            None => {
                favorites.push(id.to_string());
                true
            },
        };
        self.write_json(FAVORITES_KEY, &favorites)?;
        Ok(now_favorite)
    }

    /// Persisted chat history for a session
    pub fn chat_history(&self, session_id: &str) -> Vec<ChatExchange> {
        self.read_json(&format!("{}{}", CHAT_HISTORY_PREFIX, session_id))
            .unwrap_or_default()
    }

    pub fn save_chat_history(&self, session_id: &str, history: &[ChatExchange]) -> Result<()> {
        self.write_json(&format!("{}{}", CHAT_HISTORY_PREFIX, session_id), history)
    }

    pub fn clear_chat_history(&self, session_id: &str) -> Result<()> {
        self.store
            .remove(&format!("{}{}", CHAT_HISTORY_PREFIX, session_id))
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring unreadable local state");
                None
            },
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn context() -> AppContext {
        AppContext::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_theme_roundtrip() {
        let ctx = context();
        assert_eq!(ctx.theme(), Theme::System);
        ctx.set_theme(Theme::Dark).unwrap();
        assert_eq!(ctx.theme(), Theme::Dark);
    }

    #[test]
    fn test_auth_token_generation() {
        let ctx = context();
        assert_eq!(ctx.auth_token(), None);
        assert_eq!(ctx.credential_generation(), 0);

        ctx.set_auth_token("tok").unwrap();
        assert_eq!(ctx.auth_token(), Some("tok".to_string()));
        assert_eq!(ctx.credential_generation(), 1);

        ctx.clear_auth_token().unwrap();
        assert_eq!(ctx.auth_token(), None);
        // Clearing does not start a new generation
        assert_eq!(ctx.credential_generation(), 1);
    }

    #[test]
    fn test_toggle_favorite() {
        let ctx = context();
        assert!(ctx.toggle_favorite("sip").unwrap());
        assert!(ctx.toggle_favorite("emi").unwrap());
        assert_eq!(ctx.favorites(), vec!["sip".to_string(), "emi".to_string()]);

        assert!(!ctx.toggle_favorite("sip").unwrap());
        assert_eq!(ctx.favorites(), vec!["emi".to_string()]);
    }

    #[test]
    fn test_chat_history_per_session() {
        let ctx = context();
        let history = vec![ChatExchange::user("hi"), ChatExchange::bot("hello")];
        ctx.save_chat_history("a", &history).unwrap();

        assert_eq!(ctx.chat_history("a"), history);
        assert!(ctx.chat_history("b").is_empty());

        ctx.clear_chat_history("a").unwrap();
        assert!(ctx.chat_history("a").is_empty());
    }

    #[test]
    fn test_corrupt_value_falls_back() {
        let store = Arc::new(MemoryStore::new());
        store.set(FAVORITES_KEY, "not json".to_string()).unwrap();
        let ctx = AppContext::new(store);
        assert!(ctx.favorites().is_empty());
    }
}
