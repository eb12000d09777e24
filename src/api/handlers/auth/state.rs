//! Auth state and configuration shared by the login, logout and gate handlers.

use std::{sync::Arc, time::Duration};

use super::{credentials::CredentialStore, session::SessionStore};

const DEFAULT_SESSION_TTL_SECONDS: u64 = 15 * 60;
const DEFAULT_CREDENTIAL_LOOKUP_TIMEOUT_SECONDS: u64 = 5;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    session_ttl_seconds: u64,
    credential_lookup_timeout_seconds: u64,
    session_cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            credential_lookup_timeout_seconds: DEFAULT_CREDENTIAL_LOOKUP_TIMEOUT_SECONDS,
            session_cookie_secure: false,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_credential_lookup_timeout_seconds(mut self, seconds: u64) -> Self {
        self.credential_lookup_timeout_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_cookie_secure(mut self, secure: bool) -> Self {
        self.session_cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }

    #[must_use]
    pub fn credential_lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.credential_lookup_timeout_seconds)
    }

    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.session_cookie_secure
    }
}

pub struct AuthState {
    config: AuthConfig,
    sessions: SessionStore,
    credentials: Arc<dyn CredentialStore>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        let sessions = SessionStore::new(config.session_ttl());
        Self {
            config,
            sessions,
            credentials,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub fn credentials(&self) -> &dyn CredentialStore {
        self.credentials.as_ref()
    }
}
