//! Messaging channel adapters
//!
//! A channel delivers replies through a [`Dispatcher`].

mod messenger;

use async_trait::async_trait;

pub use messenger::{
    MessengerChannel, MessengerMessage, MessagingEvent, PAGE_OBJECT, PageEntry, Sender,
    WebhookBatch,
};

use crate::db::Credential;

/// Outcome of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Platform accepted the message
    Delivered,
    /// Send failed; the reason is for logs only
    Failed(String),
}

impl DeliveryOutcome {
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Delivers a reply to a recipient on behalf of a page
///
/// Fire-and-forget: no retry, no queue. Failures are reported through
/// [`DeliveryOutcome`] and never raised.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        text: &str,
        credential: &Credential,
        page_id: &str,
    ) -> DeliveryOutcome;
}
