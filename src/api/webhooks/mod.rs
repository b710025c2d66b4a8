//! Webhook endpoints for channel integrations

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{MethodRouter, get},
};

use super::ApiState;

pub mod messenger;

/// Build webhooks router
///
/// The page webhook is served at `/webhook` and, for platforms configured
/// with an `/api` prefix, at `/api/webhook`. Request bodies are capped at
/// [`messenger::MAX_BATCH_BYTES`].
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/webhook", page_webhook())
        .route("/api/webhook", page_webhook())
        .layer(DefaultBodyLimit::max(messenger::MAX_BATCH_BYTES))
        .with_state(state)
}

fn page_webhook() -> MethodRouter<Arc<ApiState>> {
    get(messenger::handle_verify)
        .post(messenger::handle_events)
        .fallback(messenger::method_not_allowed)
}
