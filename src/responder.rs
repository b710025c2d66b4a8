//! AI responder client
//!
//! Asks the conversational backend for a reply to one inbound message. The
//! client never fails outward: any fault produces [`ReplyOutcome::Fallback`]
//! carrying [`FALLBACK_REPLY`], so every text message still gets an answer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Reply sent when the responder cannot produce one
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error processing your message.";

/// Outcome of asking the responder for a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Reply produced by the backend
    Generated(String),
    /// Backend failed; `reply` is the fallback text
    Fallback { reply: String, reason: String },
}

impl ReplyOutcome {
    fn fallback(reason: impl Into<String>) -> Self {
        Self::Fallback {
            reply: FALLBACK_REPLY.to_string(),
            reason: reason.into(),
        }
    }

    /// Text to deliver, whichever way the reply was produced
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(reply) | Self::Fallback { reply, .. } => reply,
        }
    }

    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Source of replies for inbound messages
#[async_trait]
pub trait Responder: Send + Sync {
    /// Produce a reply to `text` received on page `page_id`
    async fn reply(&self, text: &str, page_id: &str) -> ReplyOutcome;
}

#[derive(Debug, Serialize)]
struct ReplyRequest<'a> {
    text: &'a str,
    page_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReplyResponse {
    reply: String,
}

/// Responder backed by an HTTP endpoint
///
/// `POST {url}` with `{"text", "page_id"}`, expecting `{"reply": "..."}`.
pub struct HttpResponder {
    url: String,
    client: Client,
}

impl HttpResponder {
    /// Create a responder client with a per-request timeout
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    async fn request(&self, text: &str, page_id: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.url)
            .json(&ReplyRequest { text, page_id })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!("responder returned {status}: {body}")));
        }

        let bytes = response.bytes().await?;
        let parsed: ReplyResponse = serde_json::from_slice(&bytes)?;
        Ok(parsed.reply)
    }
}

#[async_trait]
impl Responder for HttpResponder {
    async fn reply(&self, text: &str, page_id: &str) -> ReplyOutcome {
        match self.request(text, page_id).await {
            Ok(reply) => {
                tracing::debug!(page_id, "responder produced reply");
                ReplyOutcome::Generated(reply)
            }
            Err(e) => {
                tracing::warn!(page_id, error = %e, "responder failed, using fallback reply");
                ReplyOutcome::fallback(e.to_string())
            }
        }
    }
}
