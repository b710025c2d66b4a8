//! Shared test utilities
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use page_relay::{
    ApiState, Credential, CredentialLookup, CredentialStore, DeliveryOutcome, Dispatcher,
    EventPipeline, ReplyOutcome, Responder,
};
use secrecy::SecretString;
use tokio::sync::Mutex;
use tower::ServiceExt;

pub const VERIFY_TOKEN: &str = "s3cret";

/// One call made to a collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Lookup(String),
    Reply { text: String, page_id: String },
    Send { recipient: String, text: String, token: String, page_id: String },
}

/// Ordered log shared by all mocks
#[derive(Default)]
pub struct CallLog(Mutex<Vec<Call>>);

impl CallLog {
    async fn record(&self, call: Call) {
        self.0.lock().await.push(call);
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.0.lock().await.clone()
    }
}

/// Credential store with fixed tokens
pub struct MockStore {
    tokens: HashMap<String, String>,
    log: Arc<CallLog>,
}

#[async_trait]
impl CredentialStore for MockStore {
    async fn lookup(&self, page_id: &str) -> CredentialLookup {
        self.log.record(Call::Lookup(page_id.to_string())).await;
        self.tokens
            .get(page_id)
            .map_or(CredentialLookup::Missing, |t| CredentialLookup::Found(Credential::new(t.clone())))
    }
}

/// Responder returning canned replies keyed by message text
pub struct MockResponder {
    replies: HashMap<String, String>,
    log: Arc<CallLog>,
}

#[async_trait]
impl Responder for MockResponder {
    async fn reply(&self, text: &str, page_id: &str) -> ReplyOutcome {
        self.log
            .record(Call::Reply {
                text: text.to_string(),
                page_id: page_id.to_string(),
            })
            .await;
        self.replies.get(text).map_or_else(
            || ReplyOutcome::Fallback {
                reply: page_relay::responder::FALLBACK_REPLY.to_string(),
                reason: "no canned reply".to_string(),
            },
            |r| ReplyOutcome::Generated(r.clone()),
        )
    }
}

/// Dispatcher that records sends and fails for chosen recipients
pub struct MockDispatcher {
    failing: Vec<String>,
    log: Arc<CallLog>,
}

#[async_trait]
impl Dispatcher for MockDispatcher {
    async fn send(
        &self,
        recipient: &str,
        text: &str,
        credential: &Credential,
        page_id: &str,
    ) -> DeliveryOutcome {
        self.log
            .record(Call::Send {
                recipient: recipient.to_string(),
                text: text.to_string(),
                token: credential.expose().to_string(),
                page_id: page_id.to_string(),
            })
            .await;
        if self.failing.iter().any(|r| r == recipient) {
            DeliveryOutcome::Failed("mock failure".to_string())
        } else {
            DeliveryOutcome::Delivered
        }
    }
}

/// Builder for a router wired to mocks
#[derive(Default)]
pub struct TestApp {
    tokens: HashMap<String, String>,
    replies: HashMap<String, String>,
    failing: Vec<String>,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn token(mut self, page_id: &str, token: &str) -> Self {
        self.tokens.insert(page_id.to_string(), token.to_string());
        self
    }

    #[must_use]
    pub fn reply(mut self, text: &str, reply: &str) -> Self {
        self.replies.insert(text.to_string(), reply.to_string());
        self
    }

    #[must_use]
    pub fn failing_recipient(mut self, recipient: &str) -> Self {
        self.failing.push(recipient.to_string());
        self
    }

    pub fn build(self) -> (axum::Router, Arc<CallLog>) {
        let log = Arc::new(CallLog::default());
        let pipeline = EventPipeline::new(
            Arc::new(MockStore {
                tokens: self.tokens,
                log: log.clone(),
            }),
            Arc::new(MockResponder {
                replies: self.replies,
                log: log.clone(),
            }),
            Arc::new(MockDispatcher {
                failing: self.failing,
                log: log.clone(),
            }),
        );
        let state = ApiState::new(SecretString::from(VERIFY_TOKEN.to_string()), pipeline);
        (page_relay::api::router(Arc::new(state)), log)
    }
}

/// Send a request through the router and collect status and body
pub async fn send(
    router: axum::Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .oneshot(builder.body(body).expect("failed to build request"))
        .await
        .expect("router failed");

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}
