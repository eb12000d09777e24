//! Login gate: sessions, CSRF-protected login, logout and the page guard.
//!
//! ## Session record
//!
//! Each visitor owns one [`SessionRecord`] holding the logged-in username (empty
//! when anonymous), the CSRF token of the last login form and the path to return
//! to after login.
//!
//! ## Failure handling
//!
//! Every failed login answers with the same `303 See Other` to `/login`. The
//! reason is logged: CSRF mismatches at `warn` on the `muet::security` target,
//! credential store errors and timeouts at `error`, everything else at `debug`.
//! Store failures never authenticate anyone.

pub mod credentials;
mod gate;
mod login;
mod logout;
pub mod session;
mod state;
mod utils;

pub use credentials::{
    CredentialError, CredentialRecord, CredentialStore, MemoryCredentialStore, PgCredentialStore,
};
pub use gate::{is_authenticated, require_authentication, LOGIN_PATH};
pub use login::{
    issue_csrf_token, login_form, login_submit, submit, LoginForm, LoginOutcome, Rejection,
};
pub use logout::{logout, logout_session};
pub use session::{spawn_session_reaper, track_session, SessionId, SessionRecord, SessionStore};
pub use state::{AuthConfig, AuthState};
