//! HTTP API server for the page relay

pub mod health;
pub mod webhooks;

use std::sync::Arc;

use axum::{Json, Router};
use secrecy::SecretString;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::channels::MessengerChannel;
use crate::config::Config;
use crate::db::{self, PgCredentialStore};
use crate::pipeline::EventPipeline;
use crate::responder::HttpResponder;
use crate::Result;

/// Shared state for API handlers
pub struct ApiState {
    /// Secret expected in the webhook subscription handshake
    pub verify_token: SecretString,
    /// Batch processing pipeline
    pub pipeline: EventPipeline,
}

impl ApiState {
    #[must_use]
    pub const fn new(verify_token: SecretString, pipeline: EventPipeline) -> Self {
        Self {
            verify_token,
            pipeline,
        }
    }

    /// Wire the production collaborators from configuration
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client cannot be built
    pub fn from_config(config: Config) -> Result<Self> {
        let pool = db::init_pool(&config.database, config.timeouts.credential);
        let credentials = PgCredentialStore::new(pool, config.timeouts.credential);
        let responder = HttpResponder::new(config.responder_url, config.timeouts.responder)?;
        let dispatcher = MessengerChannel::new(config.send_url, config.timeouts.dispatch)?;

        let pipeline = EventPipeline::new(
            Arc::new(credentials),
            Arc::new(responder),
            Arc::new(dispatcher),
        );

        Ok(Self::new(config.verify_token, pipeline))
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

pub(crate) fn error_response(code: &str, message: &str) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: ErrorDetail {
            code: code.to_string(),
            message: message.to_string(),
        },
    })
}

/// Build the router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(webhooks::router(state.clone()))
        .merge(health::router())
        .merge(health::ready_router(state))
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    #[must_use]
    pub fn new(state: ApiState, port: u16) -> Self {
        Self {
            state: Arc::new(state),
            port,
        }
    }

    /// Run the API server until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
