//! Messenger channel adapter
//!
//! Inbound messages arrive through the page webhook (see
//! [`crate::api::webhooks::messenger`]); replies go out through the Send API
//! with the page's access token in the request body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DeliveryOutcome, Dispatcher};
use crate::db::Credential;
use crate::{Error, Result};

/// `object` value marking a batch of page events
pub const PAGE_OBJECT: &str = "page";

/// Messenger Send API client
pub struct MessengerChannel {
    send_url: String,
    client: Client,
}

impl MessengerChannel {
    /// Create a Send API client with a per-request timeout
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(send_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            send_url: send_url.into(),
            client,
        })
    }

    /// Send a text message to a page-scoped user id
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API answers non-2xx
    pub async fn send_text(
        &self,
        recipient: &str,
        text: &str,
        credential: &Credential,
    ) -> Result<()> {
        let body = SendRequest {
            recipient: Party { id: recipient },
            message: SendMessage { text },
            access_token: credential.expose(),
        };

        let response = self.client.post(&self.send_url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!("Send API error: {status} - {body}")));
        }

        Ok(())
    }
}

#[async_trait]
impl Dispatcher for MessengerChannel {
    async fn send(
        &self,
        recipient: &str,
        text: &str,
        credential: &Credential,
        page_id: &str,
    ) -> DeliveryOutcome {
        match self.send_text(recipient, text, credential).await {
            Ok(()) => {
                tracing::debug!(recipient, page_id, "Messenger reply sent");
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                tracing::error!(recipient, page_id, error = %e, "failed to send Messenger reply");
                DeliveryOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Send API request body
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    recipient: Party<'a>,
    message: SendMessage<'a>,
    access_token: &'a str,
}

#[derive(Debug, Serialize)]
struct Party<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    text: &'a str,
}

/// Page webhook payload
///
/// Entries and events stay raw until they are visited, so a malformed item
/// only costs itself and never the rest of the batch.
#[derive(Debug, Deserialize)]
pub struct WebhookBatch {
    /// Kind of object the batch describes; only [`PAGE_OBJECT`] is processed
    pub object: String,
    /// One entry per page
    #[serde(default)]
    pub entry: Vec<Value>,
}

impl WebhookBatch {
    #[must_use]
    pub fn is_page_batch(&self) -> bool {
        self.object == PAGE_OBJECT
    }

    /// Decode page entries one at a time, in payload order
    ///
    /// Each item carries the entry's page id when one can be read, so a
    /// rejected entry can still be attributed.
    pub fn entries(&self) -> impl Iterator<Item = (Option<&str>, serde_json::Result<PageEntry>)> {
        self.entry
            .iter()
            .map(|raw| (raw.get("id").and_then(Value::as_str), PageEntry::deserialize(raw)))
    }
}

/// Events for a single page
#[derive(Debug, Deserialize)]
pub struct PageEntry {
    /// Page id
    pub id: String,
    /// Messaging events, in delivery order
    #[serde(default)]
    pub messaging: Vec<Value>,
}

impl PageEntry {
    /// Decode messaging events one at a time, in delivery order
    pub fn events(&self) -> impl Iterator<Item = serde_json::Result<MessagingEvent>> {
        self.messaging.iter().map(MessagingEvent::deserialize)
    }
}

/// One inbound messaging event
#[derive(Debug, Deserialize)]
pub struct MessagingEvent {
    pub sender: Sender,
    /// Absent for deliveries, reads, postbacks and similar
    pub message: Option<MessengerMessage>,
}

impl MessagingEvent {
    /// Message text, if the event carries any
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_ref()
            .and_then(|m| m.text.as_deref())
            .filter(|t| !t.is_empty())
    }
}

/// Event sender
#[derive(Debug, Deserialize)]
pub struct Sender {
    /// Page-scoped user id
    pub id: String,
}

/// Inbound message body
#[derive(Debug, Deserialize)]
pub struct MessengerMessage {
    /// Text content; absent for attachments and stickers
    pub text: Option<String>,
}
