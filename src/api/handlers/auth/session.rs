//! Server-side sessions keyed by the `muet_session` cookie.
//!
//! Records live in process memory. Every access goes through a short write
//! lock that is never held across an `.await`, so concurrent requests on the
//! same session resolve as last-write-wins.

use anyhow::Result;
use axum::{
    extract::{Request, State},
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    fmt,
    sync::Arc,
    time::Duration,
};
use tokio::{sync::RwLock, task::JoinHandle, time::Instant};
use tracing::{debug, error};

use super::{
    state::{AuthConfig, AuthState},
    utils::generate_session_id,
};

pub const SESSION_COOKIE_NAME: &str = "muet_session";

/// Per-visitor login state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionRecord {
    /// Empty until the visitor passes credential validation.
    pub username: String,
    /// Token embedded in the most recently rendered login form.
    pub csrf_token: String,
    /// Path to return to after a successful login.
    pub redirect_target: String,
}

impl SessionRecord {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.username.is_empty()
    }
}

/// Opaque session identifier, inserted into request extensions by [`track_session`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionId(..)")
    }
}

#[derive(Debug)]
struct Entry {
    record: SessionRecord,
    last_seen: Instant,
}

impl Entry {
    fn new() -> Self {
        Self {
            record: SessionRecord::default(),
            last_seen: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_seen.elapsed() >= ttl
    }
}

#[derive(Debug)]
pub struct SessionStore {
    entries: RwLock<HashMap<SessionId, Entry>>,
    ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Map a presented cookie value to a live session, minting a new one otherwise.
    ///
    /// Unknown or expired ids are never adopted. Returns the id and whether it was
    /// created by this call.
    ///
    /// # Errors
    /// Returns an error if the OS random number generator fails.
    pub async fn resolve(&self, presented: Option<&str>) -> Result<(SessionId, bool)> {
        let mut entries = self.entries.write().await;

        if let Some(value) = presented {
            let id = SessionId(value.to_string());
            if let Some(entry) = entries.get_mut(&id) {
                if !entry.is_expired(self.ttl) {
                    entry.last_seen = Instant::now();
                    return Ok((id, false));
                }
                entries.remove(&id);
            }
        }

        let id = SessionId(generate_session_id()?);
        entries.insert(id.clone(), Entry::new());
        Ok((id, true))
    }

    /// Snapshot of the session, created with empty fields on a miss.
    pub async fn get(&self, id: &SessionId) -> SessionRecord {
        self.update(id, |record| record.clone()).await
    }

    /// Mutate the session under the store lock and return the closure's result.
    pub async fn update<R>(&self, id: &SessionId, f: impl FnOnce(&mut SessionRecord) -> R) -> R {
        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        let entry = entries.entry(id.clone()).or_insert_with(Entry::new);
        if entry.is_expired(ttl) {
            *entry = Entry::new();
        }
        entry.last_seen = Instant::now();
        f(&mut entry.record)
    }

    /// Mutate the session only if it is still live. Returns `None` when the id
    /// was expired or logged out in the meantime; nothing is created.
    pub async fn update_existing<R>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut SessionRecord) -> R,
    ) -> Option<R> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(id)?;
        if entry.is_expired(self.ttl) {
            entries.remove(id);
            return None;
        }
        entry.last_seen = Instant::now();
        Some(f(&mut entry.record))
    }

    /// Drop the session. Returns `true` if a record existed.
    pub async fn expire(&self, id: &SessionId) -> bool {
        self.entries.write().await.remove(id).is_some()
    }

    /// Remove every session idle for longer than the configured TTL.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| !entry.is_expired(ttl));
        before - entries.len()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Middleware that attaches a [`SessionId`] to every request and sets the cookie
/// when a new session was minted.
pub async fn track_session(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let presented = extract_session_id(request.headers());
    let (session_id, created) = match auth_state.sessions().resolve(presented.as_deref()).await {
        Ok(resolved) => resolved,
        Err(err) => {
            error!("Failed to resolve session: {err:#}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if created {
        debug!("Started new session");
    }

    request.extensions_mut().insert(session_id.clone());
    let mut response = next.run(request).await;

    // Handlers that already set a cookie (logout) win.
    if created && !response.headers().contains_key(SET_COOKIE) {
        match session_cookie(auth_state.config(), &session_id) {
            Ok(cookie) => {
                response.headers_mut().insert(SET_COOKIE, cookie);
            }
            Err(err) => error!("Failed to build session cookie: {err}"),
        }
    }

    response
}

/// Periodically drop idle sessions.
pub fn spawn_session_reaper(auth_state: Arc<AuthState>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let purged = auth_state.sessions().purge_expired().await;
            if purged > 0 {
                debug!(purged, "Purged expired sessions");
            }
        }
    })
}

/// Build an `HttpOnly` cookie for the session id.
pub(crate) fn session_cookie(
    config: &AuthConfig,
    session_id: &SessionId,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax",
        session_id.as_str()
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn extract_session_id(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            let val = val.trim();
            if key.trim() == SESSION_COOKIE_NAME && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}
