//! Session termination.

use axum::{
    extract::Extension,
    http::header::SET_COOKIE,
    response::Response,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

use super::{
    session::{clear_session_cookie, SessionId},
    state::AuthState,
};
use crate::api::{
    handlers::render_page,
    templates::{Templates, LOGOUT_TEMPLATE},
};

/// Forget the session, whether or not anyone was logged in.
pub async fn logout_session(auth_state: &AuthState, session_id: &SessionId) {
    if auth_state.sessions().expire(session_id).await {
        debug!("Session expired on logout");
    }
}

pub async fn logout(
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(templates): Extension<Templates>,
    Extension(session_id): Extension<SessionId>,
) -> Response {
    logout_session(&auth_state, &session_id).await;

    let mut response = render_page(templates.as_ref(), LOGOUT_TEMPLATE, &json!({}));

    // Always clear the cookie, even if the session record was missing.
    match clear_session_cookie(auth_state.config()) {
        Ok(cookie) => {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build session cookie: {err}"),
    }

    response
}
