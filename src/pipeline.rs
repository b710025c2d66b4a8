//! Batch processing
//!
//! Walks a page batch in payload order: one credential lookup per page, then
//! for each text message one responder call followed by one send. Nothing in
//! here fails; each step reports an outcome and processing moves on.

use std::sync::Arc;

use crate::channels::{DeliveryOutcome, Dispatcher, MessagingEvent, PageEntry, WebhookBatch};
use crate::db::{Credential, CredentialLookup, CredentialStore};
use crate::responder::Responder;

/// Counters for one processed batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Pages whose events were processed
    pub pages_processed: usize,
    /// Pages skipped for lack of a credential
    pub pages_skipped: usize,
    /// Page entries that could not be decoded
    pub pages_malformed: usize,
    /// Events without text
    pub events_ignored: usize,
    /// Events that could not be decoded
    pub events_malformed: usize,
    /// Replies produced by the responder
    pub replies_generated: usize,
    /// Fallback replies
    pub replies_fallback: usize,
    /// Replies accepted by the platform
    pub deliveries_ok: usize,
    /// Replies the platform did not accept
    pub deliveries_failed: usize,
}

/// Orchestrates credential lookup, reply generation and delivery
#[derive(Clone)]
pub struct EventPipeline {
    credentials: Arc<dyn CredentialStore>,
    responder: Arc<dyn Responder>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl EventPipeline {
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        responder: Arc<dyn Responder>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            credentials,
            responder,
            dispatcher,
        }
    }

    /// Credential store backing this pipeline
    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Process every page entry of a batch, in order
    ///
    /// Batches whose `object` is not a page are ignored entirely.
    pub async fn process(&self, batch: &WebhookBatch) -> BatchReport {
        let mut report = BatchReport::default();

        if !batch.is_page_batch() {
            tracing::debug!(object = %batch.object, "ignoring non-page webhook batch");
            return report;
        }

        for (page_id, entry) in batch.entries() {
            match entry {
                Ok(entry) => self.process_page(&entry, &mut report).await,
                Err(e) => {
                    tracing::warn!(
                        page_id = page_id.unwrap_or_default(),
                        error = %e,
                        "skipping malformed page entry"
                    );
                    report.pages_malformed += 1;
                }
            }
        }

        tracing::info!(
            pages_processed = report.pages_processed,
            pages_skipped = report.pages_skipped,
            pages_malformed = report.pages_malformed,
            events_ignored = report.events_ignored,
            events_malformed = report.events_malformed,
            replies_generated = report.replies_generated,
            replies_fallback = report.replies_fallback,
            deliveries_ok = report.deliveries_ok,
            deliveries_failed = report.deliveries_failed,
            "webhook batch processed"
        );

        report
    }

    async fn process_page(&self, entry: &PageEntry, report: &mut BatchReport) {
        let page_id = entry.id.as_str();

        let credential = match self.credentials.lookup(page_id).await {
            CredentialLookup::Found(credential) => credential,
            CredentialLookup::Missing => {
                tracing::warn!(
                    page_id,
                    events = entry.messaging.len(),
                    "no credential for page, skipping its events"
                );
                report.pages_skipped += 1;
                return;
            }
            CredentialLookup::Unavailable(reason) => {
                tracing::warn!(
                    page_id,
                    events = entry.messaging.len(),
                    error = %reason,
                    "credential store unavailable, skipping page events"
                );
                report.pages_skipped += 1;
                return;
            }
        };

        report.pages_processed += 1;

        for event in entry.events() {
            match event {
                Ok(event) => self.process_event(page_id, &event, &credential, report).await,
                Err(e) => {
                    tracing::warn!(page_id, error = %e, "skipping malformed messaging event");
                    report.events_malformed += 1;
                }
            }
        }
    }

    async fn process_event(
        &self,
        page_id: &str,
        event: &MessagingEvent,
        credential: &Credential,
        report: &mut BatchReport,
    ) {
        let Some(text) = event.text() else {
            report.events_ignored += 1;
            return;
        };

        let recipient = event.sender.id.as_str();
        tracing::debug!(page_id, sender = recipient, "message received");

        let reply = self.responder.reply(text, page_id).await;
        if reply.is_fallback() {
            report.replies_fallback += 1;
        } else {
            report.replies_generated += 1;
        }

        match self
            .dispatcher
            .send(recipient, reply.text(), credential, page_id)
            .await
        {
            DeliveryOutcome::Delivered => report.deliveries_ok += 1,
            DeliveryOutcome::Failed(_) => report.deliveries_failed += 1,
        }
    }
}
