//! Auth collaborator contract
//!
//! Authentication itself lives in a hosted provider. The rest of the
//! system only needs three capabilities from it: read the current session,
//! read the current user, and observe auth state changes.
//!
//! [`wait_for_session`] turns the state-change stream into a single
//! awaitable that honours both a timeout and a [`CancelSignal`]. The
//! subscription is a `watch::Receiver` owned by the future, so every exit
//! path releases it by dropping.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::cancel::CancelSignal;

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Active session issued by the auth provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for API calls
    pub access_token: String,
    /// Session owner
    pub user: User,
    /// Expiry instant
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the session has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Observable auth state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    /// Provider has not resolved the session yet
    #[default]
    Unknown,
    SignedIn(Session),
    SignedOut,
}

/// Auth errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Timed out waiting for session")]
    Timeout,

    #[error("Wait for session cancelled")]
    Cancelled,

    #[error("User is signed out")]
    SignedOut,

    #[error("Auth provider closed")]
    ProviderClosed,

    #[error("Auth provider error: {0}")]
    Provider(String),
}

impl From<AuthError> for crate::Error {
    fn from(err: AuthError) -> Self {
        crate::Error::Auth(err.to_string())
    }
}

/// Capabilities consumed from the auth provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current session, if any
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    /// Current user, if any
    async fn get_user(&self) -> Result<Option<User>, AuthError>;

    /// Subscribe to auth state changes
    fn on_auth_state_change(&self) -> watch::Receiver<AuthState>;
}

/// Wait until the provider reports a session.
///
/// Returns immediately when a session already exists. Otherwise waits on
/// state changes until signed in, signed out, `timeout` elapses or `cancel`
/// fires, whichever comes first.
pub async fn wait_for_session(
    provider: &dyn AuthProvider,
    timeout: Duration,
    cancel: &CancelSignal,
) -> Result<Session, AuthError> {
    if let Some(session) = provider.get_session().await? {
        return Ok(session);
    }

    let mut rx = provider.on_auth_state_change();
    let wait = async move {
        loop {
            let state = rx.borrow_and_update().clone();
            match state {
                AuthState::SignedIn(session) => return Ok(session),
                AuthState::SignedOut => return Err(AuthError::SignedOut),
                AuthState::Unknown => {},
            }
            if rx.changed().await.is_err() {
                return Err(AuthError::ProviderClosed);
            }
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AuthError::Cancelled),
        result = tokio::time::timeout(timeout, wait) => {
            result.unwrap_or(Err(AuthError::Timeout))
        }
    }
}

/// In-process auth provider
///
/// Used for local development and tests; state transitions are driven
/// explicitly through [`sign_in`](Self::sign_in) and
/// [`sign_out`](Self::sign_out).
pub struct InMemoryAuthProvider {
    state: watch::Sender<AuthState>,
    session: RwLock<Option<Session>>,
}

impl InMemoryAuthProvider {
    /// Create a provider in the `Unknown` state
    pub fn new() -> Self {
        let (state, _) = watch::channel(AuthState::Unknown);
        Self {
            state,
            session: RwLock::new(None),
        }
    }

    /// Record a session and notify subscribers
    pub fn sign_in(&self, session: Session) {
        *self.session.write() = Some(session.clone());
        self.state.send_replace(AuthState::SignedIn(session));
    }

    /// Drop the session and notify subscribers
    pub fn sign_out(&self) {
        *self.session.write() = None;
        self.state.send_replace(AuthState::SignedOut);
    }
}

impl Default for InMemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let session = self.session.read().clone();
        Ok(session.filter(|s| !s.is_expired()))
    }

    async fn get_user(&self) -> Result<Option<User>, AuthError> {
        Ok(self.get_session().await?.map(|s| s.user))
    }

    fn on_auth_state_change(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}
