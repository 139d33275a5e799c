//! Rejected-credential handling
//!
//! A 401 clears the stored credential and sends the user to sign-in. Retries
//! and concurrent calls can observe the same rejection many times, so the
//! guard latches per credential generation: it fires once, then stays quiet
//! until a new credential is stored.

use std::sync::Arc;

use finlit_core::{AppContext, Navigator};
use parking_lot::Mutex;

pub struct AuthGuard {
    context: Arc<AppContext>,
    navigator: Arc<dyn Navigator>,
    /// Credential generation already handled
    handled_generation: Mutex<Option<u64>>,
}

impl AuthGuard {
    pub fn new(context: Arc<AppContext>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            context,
            navigator,
            handled_generation: Mutex::new(None),
        }
    }

    /// React to an authentication failure.
    ///
    /// Returns `true` when this call cleared the credential and redirected.
    pub fn on_unauthorized(&self) -> bool {
        let generation = self.context.credential_generation();
        {
            let mut handled = self.handled_generation.lock();
            if *handled == Some(generation) {
                tracing::debug!(generation, "Credential rejection already handled");
                return false;
            }
            *handled = Some(generation);
        }

        if let Err(e) = self.context.clear_auth_token() {
            tracing::warn!(error = %e, "Failed to clear rejected credential");
        }

        tracing::warn!(generation, "Credential rejected, redirecting to sign-in");
        self.navigator.redirect_to_sign_in();
        true
    }
}
