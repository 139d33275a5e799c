//! Analytics reporting
//!
//! Events are best effort. Delivery failures are logged and dropped, and
//! identical events fired in quick succession are collapsed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use finlit_config::AnalyticsConfig;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;

use crate::api::{ApiClient, RequestOptions};

/// Event body sent to the ingestion endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsEvent {
    pub user_id: String,
    pub event_type: String,
    pub metadata: Value,
}

impl AnalyticsEvent {
    pub fn new(user_id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            event_type: event_type.into(),
            metadata: Value::Object(Default::default()),
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

pub struct AnalyticsReporter {
    client: Arc<ApiClient>,
    endpoint: String,
    enabled: bool,
    debounce: Duration,
    last_sent: Mutex<HashMap<(String, String), Instant>>,
}

impl AnalyticsReporter {
    pub fn new(config: &AnalyticsConfig, client: Arc<ApiClient>) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            enabled: config.enabled,
            debounce: Duration::from_millis(config.debounce_ms),
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Events still inside their debounce window
    pub fn debounce_entries(&self) -> usize {
        self.last_sent.lock().len()
    }

    /// Whether this event repeats one sent inside the debounce window.
    /// Records the event as sent otherwise.
    fn debounced(&self, event: &AnalyticsEvent) -> bool {
        let now = Instant::now();
        let key = (event.user_id.clone(), event.event_type.clone());
        let mut last_sent = self.last_sent.lock();

        // Expired entries can no longer suppress anything
        last_sent.retain(|_, sent| now.duration_since(*sent) < self.debounce);

        if last_sent.contains_key(&key) {
            return true;
        }
        last_sent.insert(key, now);
        false
    }

    /// Report an event. Never fails.
    ///
    /// Returns whether the event was delivered.
    pub async fn track(&self, event: AnalyticsEvent) -> bool {
        if !self.enabled {
            return false;
        }

        if self.debounced(&event) {
            tracing::debug!(event_type = %event.event_type, "Dropping repeated analytics event");
            return false;
        }

        let body = match serde_json::to_value(&event) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode analytics event");
                return false;
            },
        };

        // Non-critical path: one attempt, no retries
        let policy = self.client.policy().clone().with_max_attempts(1);
        let options = RequestOptions::post(body).with_policy(policy);

        match self.client.request::<Value>(&self.endpoint, options).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    event_type = %event.event_type,
                    error = %e,
                    "Analytics event not delivered"
                );
                false
            },
        }
    }
}
