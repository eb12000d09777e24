//! Login form and submission.
//!
//! `GET /login` stores a fresh CSRF token in the session and renders the form.
//! `POST /login` validates the token synchronously, then runs one credential
//! lookup. If the client goes away while the lookup is pending, hyper drops this
//! future and nothing after the `.await` runs: the session is left as it was and
//! no response is written.

use axum::{
    extract::{rejection::FormRejection, Extension, Form},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, error, instrument, warn};

use super::{
    gate::LOGIN_PATH,
    session::SessionId,
    state::AuthState,
    utils::{constant_time_eq, csrf_matches, generate_csrf_token, is_local_path},
};
use crate::api::{
    handlers::render_page,
    templates::{Templates, LOGGED_IN_TEMPLATE, LOGIN_TEMPLATE},
};

/// Submitted login form. Every field is optional at the parser level so a
/// missing field becomes a rejection instead of an extractor error.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<SecretString>,
    #[serde(rename = "_csrf")]
    pub csrf: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    Malformed,
    MissingField(&'static str),
    CsrfMismatch,
    UnknownUser,
    PasswordMismatch,
    LookupFailed,
    LookupTimedOut,
    SessionEnded,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated {
        username: String,
        redirect_target: Option<String>,
    },
    Rejected(Rejection),
}

pub async fn login_form(
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(templates): Extension<Templates>,
    Extension(session_id): Extension<SessionId>,
) -> Response {
    match issue_csrf_token(&auth_state, &session_id).await {
        Ok(token) => render_page(templates.as_ref(), LOGIN_TEMPLATE, &json!({ "_csrf": token })),
        Err(err) => {
            error!("Failed to issue csrf token: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Replace the session's CSRF token with a fresh one and return it.
///
/// # Errors
/// Returns an error if the OS random number generator fails.
pub async fn issue_csrf_token(
    auth_state: &AuthState,
    session_id: &SessionId,
) -> anyhow::Result<String> {
    let token = generate_csrf_token()?;
    auth_state
        .sessions()
        .update(session_id, |record| record.csrf_token.clone_from(&token))
        .await;
    Ok(token)
}

#[instrument(skip_all)]
pub async fn login_submit(
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(templates): Extension<Templates>,
    Extension(session_id): Extension<SessionId>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => Some(form),
        Err(rejection) => {
            debug!("Unreadable login form: {rejection}");
            None
        }
    };

    match submit(&auth_state, &session_id, form).await {
        LoginOutcome::Authenticated {
            redirect_target: Some(target),
            ..
        } => Redirect::to(&target).into_response(),
        LoginOutcome::Authenticated { username, .. } => render_page(
            templates.as_ref(),
            LOGGED_IN_TEMPLATE,
            &json!({ "user": username }),
        ),
        LoginOutcome::Rejected(_) => Redirect::to(LOGIN_PATH).into_response(),
    }
}

/// Run the login state machine for one submission.
///
/// The CSRF token is checked and consumed before the credential store is
/// touched. Rejections leave `username` and `redirect_target` untouched.
pub async fn submit(
    auth_state: &AuthState,
    session_id: &SessionId,
    form: Option<LoginForm>,
) -> LoginOutcome {
    let Some(form) = form else {
        return reject(Rejection::Malformed);
    };
    let Some(username) = form.username.filter(|value| !value.is_empty()) else {
        return reject(Rejection::MissingField("username"));
    };
    let Some(password) = form.password else {
        return reject(Rejection::MissingField("password"));
    };
    let Some(csrf) = form.csrf.filter(|value| !value.is_empty()) else {
        return reject(Rejection::MissingField("_csrf"));
    };

    let csrf_ok = auth_state
        .sessions()
        .update_existing(session_id, |record| {
            let ok = csrf_matches(&csrf, &record.csrf_token);
            if ok {
                record.csrf_token.clear();
            }
            ok
        })
        .await
        .unwrap_or(false);

    if !csrf_ok {
        warn!(
            target: "muet::security",
            username = %username,
            "CSRF token mismatch on login submission, possible forged request"
        );
        return LoginOutcome::Rejected(Rejection::CsrfMismatch);
    }

    let lookup = timeout(
        auth_state.config().credential_lookup_timeout(),
        auth_state.credentials().lookup(&username),
    )
    .await;

    let records = match lookup {
        Ok(Ok(records)) => records,
        Ok(Err(err)) => {
            error!(username = %username, "Credential lookup failed: {err}");
            return LoginOutcome::Rejected(Rejection::LookupFailed);
        }
        Err(_) => {
            error!(username = %username, "Credential lookup timed out");
            return LoginOutcome::Rejected(Rejection::LookupTimedOut);
        }
    };

    // First record wins; anything after it is ignored.
    let Some(record) = records.into_iter().next().filter(|r| r.username == username) else {
        return reject(Rejection::UnknownUser);
    };

    if !constant_time_eq(
        password.expose_secret().as_bytes(),
        record.password.expose_secret().as_bytes(),
    ) {
        return reject(Rejection::PasswordMismatch);
    }

    // A logout during the lookup wins: the id is gone and must stay gone.
    let Some(redirect_target) = auth_state
        .sessions()
        .update_existing(session_id, |record| {
            record.username.clone_from(&username);
            std::mem::take(&mut record.redirect_target)
        })
        .await
    else {
        return reject(Rejection::SessionEnded);
    };

    debug!(username = %username, "Login succeeded");

    LoginOutcome::Authenticated {
        username,
        redirect_target: Some(redirect_target).filter(|target| is_local_path(target)),
    }
}

fn reject(reason: Rejection) -> LoginOutcome {
    debug!(?reason, "Login rejected");
    LoginOutcome::Rejected(reason)
}
