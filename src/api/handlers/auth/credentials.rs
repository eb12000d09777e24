//! Credential lookup backends.
//!
//! The login flow only ever reads from a store. Lookups are by exact username;
//! when a store returns more than one record, the first one is used and the rest
//! are ignored.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::{Connection, PgPool};
use thiserror::Error;
use tracing::{info_span, Instrument};

const LOOKUP_QUERY: &str = "SELECT username, password FROM users WHERE username = $1 LIMIT 1";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential query failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// A stored `(username, password)` pair.
#[derive(Debug)]
pub struct CredentialRecord {
    pub username: String,
    pub password: SecretString,
}

impl CredentialRecord {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Return the records stored for `username`, in store order.
    async fn lookup(&self, username: &str) -> Result<Vec<CredentialRecord>, CredentialError>;

    /// Report whether the backing store is reachable.
    async fn ping(&self) -> Result<(), CredentialError> {
        Ok(())
    }
}

/// Reads the `users` table.
#[derive(Clone, Debug)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn lookup(&self, username: &str) -> Result<Vec<CredentialRecord>, CredentialError> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.sql.table = "users"
        );
        let rows: Vec<(String, String)> = sqlx::query_as(LOOKUP_QUERY)
            .bind(username)
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(username, password)| CredentialRecord::new(username, password))
            .collect())
    }

    async fn ping(&self) -> Result<(), CredentialError> {
        if self.pool.is_closed() {
            return Err(CredentialError::Unavailable(
                "connection pool is closed".to_string(),
            ));
        }
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self.pool.acquire().instrument(acquire_span).await?;
        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(ping_span).await?;
        Ok(())
    }
}

/// In-process store, handy for demos and tests. Keeps insertion order, so
/// duplicate usernames resolve to the first one added.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: Vec<(String, SecretString)>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.users
            .push((username.into(), SecretString::from(password.into())));
        self
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn lookup(&self, username: &str) -> Result<Vec<CredentialRecord>, CredentialError> {
        Ok(self
            .users
            .iter()
            .filter(|(stored, _)| stored == username)
            .map(|(stored, password)| CredentialRecord::new(stored, password.expose_secret()))
            .collect())
    }
}
