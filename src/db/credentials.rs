//! Page credential lookup
//!
//! Resolves the Send API access token for a page. Tokens are fetched on every
//! call and never cached, so a rotated token takes effect on the next batch.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::DbPool;
use crate::{Error, Result};

const LOOKUP_SQL: &str = "SELECT access_token FROM page_credentials WHERE page_id = $1 LIMIT 1";

/// Bearer token authorizing outbound sends for one page
pub struct Credential(SecretString);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Raw token, for attaching to an outbound request
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Result of resolving a page's credential
#[derive(Debug)]
pub enum CredentialLookup {
    /// Token found
    Found(Credential),
    /// Page has no token configured
    Missing,
    /// Store unreachable, query failed or timed out
    Unavailable(String),
}

impl CredentialLookup {
    /// Collapse to the credential, treating missing and unavailable alike
    #[must_use]
    pub fn into_credential(self) -> Option<Credential> {
        match self {
            Self::Found(credential) => Some(credential),
            Self::Missing | Self::Unavailable(_) => None,
        }
    }
}

/// Keyed lookup of page credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Resolve the credential for a page; never fails, see [`CredentialLookup`]
    async fn lookup(&self, page_id: &str) -> CredentialLookup;

    /// Verify the store is reachable
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot answer a trivial query
    async fn check(&self) -> Result<()> {
        Ok(())
    }
}

/// `PostgreSQL`-backed credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: DbPool,
    timeout: Duration,
}

impl PgCredentialStore {
    #[must_use]
    pub const fn new(pool: DbPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// One pooled connection, one query. The connection guard goes back to
    /// the pool when this future completes or is dropped.
    async fn fetch(&self, page_id: &str) -> Result<Option<String>> {
        let mut conn = self.pool.acquire().await?;

        let token: Option<Option<String>> = sqlx::query_scalar(LOOKUP_SQL)
            .bind(page_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(token.flatten())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn lookup(&self, page_id: &str) -> CredentialLookup {
        let fetched = tokio::time::timeout(self.timeout, self.fetch(page_id))
            .await
            .unwrap_or(Err(Error::DatabaseTimeout(self.timeout)));

        match fetched {
            Ok(Some(token)) if !token.is_empty() => CredentialLookup::Found(Credential::new(token)),
            Ok(_) => {
                tracing::debug!(page_id, "no credential configured for page");
                CredentialLookup::Missing
            }
            Err(e) => {
                tracing::warn!(page_id, error = %e, "credential lookup failed");
                CredentialLookup::Unavailable(e.to_string())
            }
        }
    }

    async fn check(&self) -> Result<()> {
        let ping = async {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok::<(), Error>(())
        };

        tokio::time::timeout(self.timeout, ping)
            .await
            .unwrap_or(Err(Error::DatabaseTimeout(self.timeout)))
    }
}
