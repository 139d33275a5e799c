//! Chat session registry
//!
//! Sessions live in memory, keyed by the id in the request path. The
//! registry is bounded: idle sessions are evicted, and new ids are refused
//! once `max_sessions` live sessions exist.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use finlit_chat::ChatSession;
use finlit_config::ChatConfig;
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::ServerError;

struct Entry {
    session: Arc<ChatSession>,
    last_activity: Mutex<Instant>,
}

impl Entry {
    fn new(session: Arc<ChatSession>) -> Self {
        Self {
            session,
            last_activity: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) -> Arc<ChatSession> {
        *self.last_activity.lock() = Instant::now();
        self.session.clone()
    }

    /// Idle for longer than `timeout` and not serving a request
    fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        !self.session.is_busy() && now.duration_since(*self.last_activity.lock()) > timeout
    }
}

/// Session manager
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Entry>>,
    max_sessions: usize,
    idle_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    pub fn new(max_sessions: usize, idle_timeout: Duration, cleanup_interval: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            idle_timeout,
            cleanup_interval,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(
            config.max_sessions,
            Duration::from_secs(config.session_idle_timeout_secs),
            Duration::from_secs(config.session_cleanup_interval_secs),
        )
    }

    /// Session by id, opened with `open` on first use.
    ///
    /// At capacity, idle sessions are evicted first; if none are idle the
    /// new id is refused.
    pub fn get_or_create(
        &self,
        id: &str,
        open: impl FnOnce() -> ChatSession,
    ) -> Result<Arc<ChatSession>, ServerError> {
        if let Some(entry) = self.sessions.read().get(id) {
            return Ok(entry.touch());
        }

        let mut sessions = self.sessions.write();
        if let Some(entry) = sessions.get(id) {
            return Ok(entry.touch());
        }

        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut sessions);

            if sessions.len() >= self.max_sessions {
                tracing::warn!(max_sessions = self.max_sessions, "Chat session limit reached");
                return Err(ServerError::Unavailable(
                    "Too many active chat sessions".to_string(),
                ));
            }
        }

        let session = Arc::new(open());
        sessions.insert(id.to_string(), Entry::new(session.clone()));
        tracing::debug!(session_id = %id, live = sessions.len(), "Created chat session");
        Ok(session)
    }

    /// Existing session by id; counts as activity
    pub fn get(&self, id: &str) -> Option<Arc<ChatSession>> {
        self.sessions.read().get(id).map(Entry::touch)
    }

    /// Drop a session from the registry
    pub fn remove(&self, id: &str) -> Option<Arc<ChatSession>> {
        let removed = self.sessions.write().remove(id).map(|entry| entry.session);
        if removed.is_some() {
            tracing::debug!(session_id = %id, "Removed chat session");
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Evict idle sessions. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions)
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<String, Entry>) -> usize {
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(now, self.idle_timeout));
        before - sessions.len()
    }

    /// Sweep idle sessions every `cleanup_interval` until the returned
    /// sender is set to `true`.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let removed = manager.cleanup_expired();
                        if removed > 0 {
                            tracing::info!(
                                removed,
                                remaining = manager.count(),
                                "Evicted idle chat sessions"
                            );
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(max_sessions: usize) -> SessionManager {
        SessionManager::new(max_sessions, Duration::from_secs(60), Duration::from_secs(10))
    }

    #[test]
    fn test_get_or_create_reuses_session() {
        let manager = manager(10);
        let first = manager.get_or_create("a", || ChatSession::new("a")).unwrap();
        let again = manager.get_or_create("a", || ChatSession::new("other")).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(manager.count(), 1);
    }

    #[test]
    fn test_refuses_new_ids_at_capacity() {
        let manager = manager(2);
        manager.get_or_create("a", || ChatSession::new("a")).unwrap();
        manager.get_or_create("b", || ChatSession::new("b")).unwrap();

        let err = manager.get_or_create("c", || ChatSession::new("c")).unwrap_err();
        assert!(matches!(err, ServerError::Unavailable(_)));
        // Existing ids are still served
        assert!(manager.get_or_create("a", || ChatSession::new("a")).is_ok());
    }

    #[test]
    fn test_remove() {
        let manager = manager(10);
        manager.get_or_create("a", || ChatSession::new("a")).unwrap();
        assert!(manager.remove("a").is_some());
        assert!(manager.remove("a").is_none());
        assert!(manager.get("a").is_none());
        assert_eq!(manager.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_expire() {
        let manager = manager(10);
        manager.get_or_create("idle", || ChatSession::new("idle")).unwrap();
        manager.get_or_create("active", || ChatSession::new("active")).unwrap();

        tokio::time::advance(Duration::from_secs(45)).await;
        manager.get("active");
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(manager.cleanup_expired(), 1);
        assert!(manager.get("idle").is_none());
        assert!(manager.get("active").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_session_never_expires() {
        let manager = manager(10);
        let session = manager.get_or_create("a", || ChatSession::new("a")).unwrap();
        let _guard = session.begin_request().unwrap();

        tokio::time::advance(Duration::from_secs(600)).await;
        assert_eq!(manager.cleanup_expired(), 0);
        assert_eq!(manager.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_reclaimed_from_idle_sessions() {
        let manager = manager(1);
        manager.get_or_create("old", || ChatSession::new("old")).unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(manager.get_or_create("new", || ChatSession::new("new")).is_ok());
        assert!(manager.get("old").is_none());
        assert_eq!(manager.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_sweeps_and_stops() {
        let manager = Arc::new(manager(10));
        manager.get_or_create("a", || ChatSession::new("a")).unwrap();
        let shutdown = manager.start_cleanup_task();

        tokio::time::sleep(Duration::from_secs(75)).await;
        assert_eq!(manager.count(), 0);

        shutdown.send(true).unwrap();
    }
}
