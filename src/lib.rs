//! Page Relay - Messenger page webhook relay for AI assistants
//!
//! Receives page webhook batches, asks an AI responder for a reply to each
//! text message and sends it back through the Send API using the page's own
//! access token.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Messenger Platform (webhook)            │
//! └────────────────────┬────────────────────────────────┘
//!                      │ GET verify / POST batch
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Event Pipeline                      │
//! │   per page: credential lookup                        │
//! │   per text message: responder ─► Send API            │
//! └──────┬──────────────────┬─────────────────┬─────────┘
//!        │                  │                 │
//! ┌──────▼──────┐   ┌───────▼──────┐   ┌──────▼───────┐
//! │ PostgreSQL  │   │ AI responder │   │  Send API    │
//! │ page tokens │   │   (HTTP)     │   │  (HTTP)      │
//! └─────────────┘   └──────────────┘   └──────────────┘
//! ```

pub mod api;
pub mod channels;
pub mod config;
pub mod db;
pub mod error;
pub mod pipeline;
pub mod responder;

pub use api::{ApiServer, ApiState};
pub use channels::{DeliveryOutcome, Dispatcher, MessengerChannel, WebhookBatch};
pub use config::Config;
pub use db::{Credential, CredentialLookup, CredentialStore, DbPool, PgCredentialStore};
pub use error::{Error, Result};
pub use pipeline::{BatchReport, EventPipeline};
pub use responder::{HttpResponder, ReplyOutcome, Responder};
