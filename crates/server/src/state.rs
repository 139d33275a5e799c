//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;
use std::time::Instant;

use finlit_calculators::CalculatorEngine;
use finlit_chat::{ChatService, ChatSession};
use finlit_client::{ApiClient, ReqwestTransport, Transport};
use finlit_config::{load_settings, Settings};
use finlit_core::{AppContext, JsonFileStore, KeyValueStore, MemoryStore, Navigator};
use parking_lot::RwLock;

use crate::session::SessionManager;
use crate::ServerError;

/// Navigator for a headless backend: a rejected upstream credential can
/// only be reported
#[derive(Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect_to_sign_in(&self) {
        tracing::warn!("Upstream rejected the stored credential; sign-in required");
    }
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration; replaced wholesale on reload
    pub config: Arc<RwLock<Settings>>,
    /// Calculators, rebuilt on reload since the tax schedule is configurable
    pub calculators: Arc<RwLock<CalculatorEngine>>,
    pub chat: Arc<ChatService>,
    pub context: Arc<AppContext>,
    sessions: Arc<SessionManager>,
    started_at: Instant,
    /// Environment name for config reload
    env: Option<String>,
}

impl AppState {
    /// State wired to the real network and the configured store
    pub fn new(config: Settings) -> Result<Self, ServerError> {
        let store: Arc<dyn KeyValueStore> = match &config.storage.path {
            Some(path) => Arc::new(
                JsonFileStore::open(path).map_err(|e| ServerError::Config(e.to_string()))?,
            ),
            None => Arc::new(MemoryStore::new()),
        };
        let transport =
            Arc::new(ReqwestTransport::new().map_err(|e| ServerError::Config(e.to_string()))?);
        Self::with_parts(config, transport, store)
    }

    /// State with an explicit transport and store
    pub fn with_parts(
        config: Settings,
        transport: Arc<dyn Transport>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ServerError> {
        let context = Arc::new(AppContext::new(store));
        let client = Arc::new(ApiClient::new(
            &config.client,
            transport,
            context.clone(),
            Arc::new(LogNavigator),
        ));
        let chat = ChatService::from_config(&config.chat, client)?;
        let calculators = CalculatorEngine::from_settings(&config.tax);
        let sessions = Arc::new(SessionManager::from_config(&config.chat));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            calculators: Arc::new(RwLock::new(calculators)),
            chat: Arc::new(chat),
            context,
            sessions,
            started_at: Instant::now(),
            env: None,
        })
    }

    pub fn with_env(mut self, env: Option<String>) -> Self {
        self.env = env;
        self
    }

    /// Get a read guard to the current configuration
    pub fn get_config(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.config.read()
    }

    /// Reload configuration from files and rebuild the calculators.
    ///
    /// Chat and client settings take effect on restart.
    pub fn reload_config(&self) -> Result<(), ServerError> {
        let new_config = load_settings(self.env.as_deref())
            .map_err(|e| ServerError::Config(format!("Failed to reload config: {}", e)))?;

        *self.calculators.write() = CalculatorEngine::from_settings(&new_config.tax);
        *self.config.write() = new_config;

        tracing::info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Session by id, created on first use.
    ///
    /// Fails with `Unavailable` when the session registry is full.
    pub fn session(&self, id: &str) -> Result<Arc<ChatSession>, ServerError> {
        let persist = self.config.read().chat.persist_history;
        self.sessions.get_or_create(id, || {
            if persist {
                ChatSession::with_persistence(id, self.context.clone())
            } else {
                ChatSession::new(id)
            }
        })
    }

    /// Existing session, without creating one
    pub fn existing_session(&self, id: &str) -> Option<Arc<ChatSession>> {
        self.sessions.get(id)
    }

    /// Forget a session. Persisted history is left to the caller.
    pub fn remove_session(&self, id: &str) -> Option<Arc<ChatSession>> {
        self.sessions.remove(id)
    }

    /// Session registry, for the background idle sweep
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn session_count(&self) -> usize {
        self.sessions.count()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
