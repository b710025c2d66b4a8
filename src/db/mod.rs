//! Database module for the page credential store

pub mod credentials;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};

use crate::config::DatabaseConfig;

pub use credentials::{Credential, CredentialLookup, CredentialStore, PgCredentialStore};

/// Database connection pool
pub type DbPool = sqlx::PgPool;

/// Build the credential store pool without connecting
///
/// Connections are opened on first acquire, so startup does not fail when
/// the store is briefly unreachable; lookups degrade instead. Every
/// connection requires TLS.
#[must_use]
pub fn init_pool(config: &DatabaseConfig, acquire_timeout: Duration) -> DbPool {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(config.password.expose_secret())
        .database(&config.database)
        .ssl_mode(PgSslMode::Require);

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(acquire_timeout)
        .idle_timeout(Duration::from_secs(600))
        .connect_lazy_with(options);

    tracing::info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        max_connections = config.max_connections,
        "credential store pool initialized"
    );

    pool
}
