//! API client
//!
//! Resolves endpoints against the configured base URL, attaches the bearer
//! credential, and runs each call through the retry policy.

use std::sync::Arc;

use finlit_config::ClientConfig;
use finlit_core::{AppContext, CancelSignal, Navigator};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::auth_guard::AuthGuard;
use crate::retry::RetryPolicy;
use crate::transport::{HttpMethod, HttpRequest, Transport};
use crate::ClientError;

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub body: Option<Value>,
    /// Overrides the client's default policy
    pub policy: Option<RetryPolicy>,
    pub cancel: CancelSignal,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }
}

pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    context: Arc<AppContext>,
    auth_guard: AuthGuard,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        context: Arc<AppContext>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            transport,
            policy: RetryPolicy::from_client_config(config),
            auth_guard: AuthGuard::new(context.clone(), navigator),
            context,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.context
    }

    /// Absolute URL for `endpoint`; absolute endpoints pass through
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Issue a request and decode the JSON response.
    ///
    /// An empty success body decodes as `null`, so `()` and `Option<_>`
    /// are valid response types for endpoints that return nothing.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        let url = self.url(endpoint);
        let policy = options.policy.unwrap_or_else(|| self.policy.clone());
        let method = options.method;
        let body = options.body.as_ref();
        let target = url.as_str();

        let text = policy
            .run(
                &options.cancel,
                move |attempt| self.send_once(method, target, body, attempt),
                ClientError::is_retryable,
            )
            .await
            .map_err(|e| {
                tracing::debug!(endpoint = %url, error = %e, "Request failed");
                e
            })?;

        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        self.request(endpoint, RequestOptions::get()).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let body =
            serde_json::to_value(body).map_err(|e| ClientError::Configuration(e.to_string()))?;
        self.request(endpoint, RequestOptions::post(body)).await
    }

    /// One attempt; returns the raw body of a 2xx response
    async fn send_once(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
        attempt: u32,
    ) -> Result<String, ClientError> {
        let mut request = HttpRequest::new(method, url);
        if let Some(token) = self.context.auth_token() {
            request = request.with_bearer(&token);
        }
        if let Some(body) = body {
            request = request.with_json(body.clone());
        }

        tracing::debug!(%method, endpoint = %url, attempt, "Sending request");
        let response = self.transport.send(request).await?;

        if response.is_success() {
            return Ok(response.body);
        }

        if response.status == 401 {
            self.auth_guard.on_unauthorized();
            return Err(ClientError::Unauthorized);
        }

        Err(ClientError::Status {
            status: response.status,
            body: response.body,
        })
    }
}
