//! Messenger page webhook handler
//!
//! `GET` answers the subscription handshake, `POST` receives event batches.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        Query, State,
        rejection::{BytesRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::api::{ApiState, error_response};
use crate::channels::WebhookBatch;

/// `hub.mode` value announcing a subscription
pub const SUBSCRIBE_MODE: &str = "subscribe";

/// Body acknowledging a received batch
pub const EVENT_RECEIVED: &str = "EVENT_RECEIVED";

/// Largest webhook body read into memory; bigger batches are acknowledged
/// and discarded
pub const MAX_BATCH_BYTES: usize = 1024 * 1024;

/// Query parameters of the subscription handshake
#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Whether a handshake may subscribe: mode must be `subscribe` and the
/// token must equal the configured secret
#[must_use]
pub fn is_authorized(params: &VerifyParams, expected_token: &str) -> bool {
    let mode_ok = params.mode.as_deref() == Some(SUBSCRIBE_MODE);
    let token_ok = params
        .verify_token
        .as_deref()
        .is_some_and(|token| constant_time_eq(token.as_bytes(), expected_token.as_bytes()));

    mode_ok && token_ok
}

/// Answer the subscription handshake by echoing `hub.challenge`
///
/// A query that cannot be read (repeated keys, bad encoding) is rejected
/// exactly like a wrong token.
pub async fn handle_verify(
    State(state): State<Arc<ApiState>>,
    query: Result<Query<VerifyParams>, QueryRejection>,
) -> Response {
    let params = match query {
        Ok(Query(params)) => params,
        Err(e) => {
            tracing::warn!(error = %e, "rejected webhook verification with unreadable query");
            return verification_failed();
        }
    };

    if !is_authorized(&params, state.verify_token.expose_secret()) {
        tracing::warn!(mode = ?params.mode, "rejected webhook verification");
        return verification_failed();
    }

    tracing::info!("webhook subscription verified");
    (StatusCode::OK, params.challenge.unwrap_or_default()).into_response()
}

fn verification_failed() -> Response {
    (
        StatusCode::FORBIDDEN,
        error_response("forbidden", "webhook verification failed"),
    )
        .into_response()
}

/// Receive a batch of page events
///
/// Always acknowledged: per-event failures are handled inside the pipeline,
/// and a batch that fails to parse or exceeds [`MAX_BATCH_BYTES`] would fail
/// again if redelivered.
pub async fn handle_events(
    State(state): State<Arc<ApiState>>,
    body: Result<Bytes, BytesRejection>,
) -> (StatusCode, &'static str) {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, limit = MAX_BATCH_BYTES, "discarding unreadable webhook body");
            return (StatusCode::OK, EVENT_RECEIVED);
        }
    };

    match serde_json::from_slice::<WebhookBatch>(&body) {
        Ok(batch) => {
            tracing::debug!(
                object = %batch.object,
                entries = batch.entry.len(),
                "received webhook batch"
            );
            state.pipeline.process(&batch).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, bytes = body.len(), "discarding malformed webhook batch");
        }
    }

    (StatusCode::OK, EVENT_RECEIVED)
}

/// Any other method on the webhook path
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        error_response("method_not_allowed", "method not allowed"),
    )
        .into_response()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
