//! Chat service
//!
//! Forwards a user message and a short window of prior exchanges to the
//! chat endpoint. Any failure on that path (transport error, timeout,
//! non-2xx, or a body reporting `success: false`) is answered from the
//! fallback rules instead, so callers always get a reply.

use std::sync::Arc;

use finlit_client::{ApiClient, ClientError, RequestOptions, RetryPolicy};
use finlit_config::ChatConfig;
use finlit_core::{CancelSignal, ChatExchange};
use serde::{Deserialize, Serialize};

use crate::fallback::FallbackRules;
use crate::session::ChatSession;
use crate::ChatError;

/// Where a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Remote,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub text: String,
    pub source: ReplySource,
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    message: &'a str,
    context: ChatRequestContext<'a>,
}

#[derive(Serialize)]
struct ChatRequestContext<'a> {
    history: &'a [ChatExchange],
}

#[derive(Deserialize)]
struct ChatResponseBody {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    success: bool,
}

pub struct ChatService {
    client: Arc<ApiClient>,
    endpoint: String,
    policy: RetryPolicy,
    rules: FallbackRules,
    context_window: usize,
    max_message_chars: usize,
}

impl ChatService {
    pub fn new(config: &ChatConfig, client: Arc<ApiClient>, rules: FallbackRules) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            policy: RetryPolicy::from_chat_config(config),
            rules,
            context_window: config.context_window,
            max_message_chars: config.max_message_chars,
        }
    }

    /// Build from config, loading fallback rules from the configured file
    /// or using the built-in list
    pub fn from_config(config: &ChatConfig, client: Arc<ApiClient>) -> Result<Self, ChatError> {
        let rules = match &config.fallback_rules_path {
            Some(path) => FallbackRules::from_yaml_file(path)?,
            None => FallbackRules::default(),
        };
        Ok(Self::new(config, client, rules))
    }

    pub fn rules(&self) -> &FallbackRules {
        &self.rules
    }

    /// Answer `message` within `session`
    pub async fn ask(&self, session: &ChatSession, message: &str) -> Result<ChatReply, ChatError> {
        self.ask_with_cancel(session, message, CancelSignal::never()).await
    }

    /// Like [`ask`](Self::ask), with a caller-held cancel signal for the
    /// remote call. A cancelled call is answered from the fallback rules.
    pub async fn ask_with_cancel(
        &self,
        session: &ChatSession,
        message: &str,
        cancel: CancelSignal,
    ) -> Result<ChatReply, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let chars = message.chars().count();
        if chars > self.max_message_chars {
            return Err(ChatError::MessageTooLong(chars, self.max_message_chars));
        }

        let _in_flight = session.begin_request()?;

        // Window is taken before the new message joins the history
        let window = session.context_window(self.context_window);
        session.push(ChatExchange::user(message));

        let reply = match self.remote_reply(message, &window, cancel).await {
            Ok(text) => ChatReply {
                text,
                source: ReplySource::Remote,
            },
            Err(e) => {
                tracing::info!(
                    session_id = %session.id(),
                    error = %e,
                    "Chat endpoint unavailable, answering from fallback rules"
                );
                ChatReply {
                    text: self.rules.reply_for(message).to_string(),
                    source: ReplySource::Fallback,
                }
            },
        };

        session.push(ChatExchange::bot(reply.text.clone()));
        Ok(reply)
    }

    async fn remote_reply(
        &self,
        message: &str,
        history: &[ChatExchange],
        cancel: CancelSignal,
    ) -> Result<String, ClientError> {
        let body = serde_json::to_value(ChatRequestBody {
            message,
            context: ChatRequestContext { history },
        })
        .map_err(|e| ClientError::Configuration(e.to_string()))?;

        let options = RequestOptions::post(body)
            .with_policy(self.policy.clone())
            .with_cancel(cancel);
        let response: ChatResponseBody = self.client.request(&self.endpoint, options).await?;

        match response.response {
            Some(text) if response.success && !text.trim().is_empty() => Ok(text),
            _ => Err(ClientError::InvalidResponse(
                "chat endpoint reported failure".to_string(),
            )),
        }
    }
}
