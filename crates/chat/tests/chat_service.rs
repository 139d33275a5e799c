//! ChatService remote and fallback paths

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use finlit_chat::{ChatError, ChatService, ChatSession, FallbackRules, ReplySource};
use finlit_client::{ApiClient, HttpRequest, HttpResponse, Transport, TransportError};
use finlit_config::{ChatConfig, ClientConfig};
use finlit_core::{cancel_pair, AppContext, ChatRole, MemoryStore, Navigator};
use parking_lot::Mutex;
use serde_json::Value;

#[derive(Default)]
struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    latency: Option<Duration>,
}

impl ScriptedTransport {
    fn replying(bodies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(
                bodies
                    .iter()
                    .map(|b| Ok(HttpResponse::new(200, *b)))
                    .collect(),
            ),
            ..Self::default()
        })
    }

    fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(
                std::iter::repeat_with(|| Ok(HttpResponse::new(status, "down")))
                    .take(10)
                    .collect(),
            ),
            ..Self::default()
        })
    }

    fn bodies(&self) -> Vec<Value> {
        self.requests
            .lock()
            .iter()
            .filter_map(|r| r.body.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| Err(TransportError::Connect("no script".into())))
    }
}

struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn redirect_to_sign_in(&self) {}
}

fn service(transport: Arc<ScriptedTransport>) -> ChatService {
    let context = Arc::new(AppContext::new(Arc::new(MemoryStore::new())));
    let client = Arc::new(ApiClient::new(
        &ClientConfig::default(),
        transport,
        context,
        Arc::new(NoopNavigator),
    ));
    ChatService::new(&ChatConfig::default(), client, FallbackRules::default())
}

fn remote(text: &str) -> String {
    serde_json::json!({"response": text, "success": true}).to_string()
}

#[tokio::test]
async fn test_remote_reply_and_history() {
    let first = remote("Start with an emergency fund.");
    let second = remote("Yes, monthly works.");
    let transport = ScriptedTransport::replying(&[&first, &second]);
    let service = service(transport.clone());
    let session = ChatSession::new("s1");

    let reply = service.ask(&session, "  How do I start saving?  ").await.unwrap();
    assert_eq!(reply.source, ReplySource::Remote);
    assert_eq!(reply.text, "Start with an emergency fund.");

    let history = session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, ChatRole::User);
    assert_eq!(history[0].text, "How do I start saving?");
    assert_eq!(history[1].role, ChatRole::Bot);

    service.ask(&session, "Monthly?").await.unwrap();
    assert_eq!(session.len(), 4);

    let bodies = transport.bodies();
    assert_eq!(bodies[0]["message"], "How do I start saving?");
    assert_eq!(bodies[0]["context"]["history"].as_array().unwrap().len(), 0);

    // Second request carries the previous two exchanges, not the new message
    let sent = bodies[1]["context"]["history"].as_array().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["role"], "user");
    assert_eq!(sent[1]["text"], "Start with an emergency fund.");
}

#[tokio::test]
async fn test_context_window_is_bounded() {
    let replies: Vec<String> = (0..4).map(|i| remote(&format!("answer {}", i))).collect();
    let refs: Vec<&str> = replies.iter().map(|s| s.as_str()).collect();
    let transport = ScriptedTransport::replying(&refs);
    let service = service(transport.clone());
    let session = ChatSession::new("s1");

    for i in 0..4 {
        service.ask(&session, &format!("question {}", i)).await.unwrap();
    }

    let last = &transport.bodies()[3];
    let sent = last["context"]["history"].as_array().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["text"], "question 2");
    assert_eq!(sent[1]["text"], "answer 2");
}

#[tokio::test(start_paused = true)]
async fn test_server_errors_fall_back_after_retries() {
    let transport = ScriptedTransport::failing(503);
    let service = service(transport.clone());
    let session = ChatSession::new("s1");

    let reply = service.ask(&session, "What is an EMI?").await.unwrap();
    assert_eq!(reply.source, ReplySource::Fallback);
    assert_eq!(reply.text, service.rules().reply_for("emi"));
    assert_eq!(transport.requests.lock().len(), 3);
    assert_eq!(session.len(), 2);
}

#[tokio::test]
async fn test_unsuccessful_body_falls_back() {
    let transport = ScriptedTransport::replying(&[r#"{"response": "", "success": false}"#]);
    let service = service(transport);
    let session = ChatSession::new("s1");

    let reply = service.ask(&session, "tell me a joke").await.unwrap();
    assert_eq!(reply.source, ReplySource::Fallback);
    assert_eq!(reply.text, service.rules().default_reply);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_falls_back_within_bound() {
    let transport = Arc::new(ScriptedTransport {
        latency: Some(Duration::from_secs(120)),
        ..ScriptedTransport::default()
    });
    let service = service(transport.clone());
    let session = ChatSession::new("s1");

    let started = tokio::time::Instant::now();
    let reply = service.ask(&session, "fd rates?").await.unwrap();

    assert_eq!(reply.source, ReplySource::Fallback);
    assert_eq!(reply.text, service.rules().reply_for("fd"));
    // 3 × 15s + 1s + 2s backoff
    assert!(started.elapsed() <= Duration::from_secs(48) + Duration::from_millis(10));
    assert_eq!(transport.requests.lock().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_request_falls_back() {
    let transport = Arc::new(ScriptedTransport {
        latency: Some(Duration::from_secs(10)),
        ..ScriptedTransport::default()
    });
    let service = service(transport.clone());
    let session = ChatSession::new("s1");
    let (handle, signal) = cancel_pair();

    let started = tokio::time::Instant::now();
    let (reply, _) = tokio::join!(
        service.ask_with_cancel(&session, "how do sips work", signal),
        async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            handle.cancel();
        }
    );

    let reply = reply.unwrap();
    assert_eq!(reply.source, ReplySource::Fallback);
    assert_eq!(reply.text, service.rules().reply_for("sip"));
    // No retries after a cancel
    assert_eq!(transport.requests.lock().len(), 1);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!session.is_busy());
    assert_eq!(session.len(), 2);
}

#[tokio::test]
async fn test_rejects_empty_and_oversized_messages() {
    let transport = ScriptedTransport::replying(&[]);
    let service = service(transport.clone());
    let session = ChatSession::new("s1");

    assert_eq!(service.ask(&session, "   ").await.unwrap_err(), ChatError::EmptyMessage);

    let long = "a".repeat(ChatConfig::default().max_message_chars + 1);
    assert!(matches!(
        service.ask(&session, &long).await.unwrap_err(),
        ChatError::MessageTooLong(_, _)
    ));

    assert!(session.is_empty());
    assert!(transport.requests.lock().is_empty());
}

#[tokio::test]
async fn test_busy_session_rejected() {
    let transport = ScriptedTransport::replying(&[]);
    let service = service(transport.clone());
    let session = ChatSession::new("s1");

    let _guard = session.begin_request().unwrap();
    assert_eq!(service.ask(&session, "hello").await.unwrap_err(), ChatError::Busy);
    assert!(session.is_empty());
    assert!(transport.requests.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slot_released_after_reply() {
    let transport = ScriptedTransport::replying(&[]);
    let service = service(transport);
    let session = ChatSession::new("s1");

    service.ask(&session, "hello").await.unwrap();
    assert!(!session.is_busy());
}
