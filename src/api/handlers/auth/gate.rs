//! Guard for pages that need a logged-in visitor.

use axum::response::Redirect;
use tracing::debug;

use super::{
    session::{SessionId, SessionRecord},
    state::AuthState,
};

pub const LOGIN_PATH: &str = "/login";

#[must_use]
pub fn is_authenticated(session: &SessionRecord) -> bool {
    session.is_authenticated()
}

/// Return the current username, or remember `path` and send the visitor to login.
///
/// The `Err` side is a complete response; callers return it as-is.
pub async fn require_authentication(
    auth_state: &AuthState,
    session_id: &SessionId,
    path: &str,
) -> Result<String, Redirect> {
    let username = auth_state
        .sessions()
        .update(session_id, |record| {
            if is_authenticated(record) {
                Some(record.username.clone())
            } else {
                record.redirect_target = path.to_string();
                None
            }
        })
        .await;

    username.ok_or_else(|| {
        debug!(path, "Login required");
        Redirect::to(LOGIN_PATH)
    })
}
