//! The landing page. Also the template for any page that needs a logged-in user.

use axum::{
    extract::{Extension, OriginalUri},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

use super::{
    auth::{require_authentication, AuthState, SessionId},
    render_page,
};
use crate::api::templates::{Templates, INDEX_TEMPLATE};

pub async fn index(
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(templates): Extension<Templates>,
    Extension(session_id): Extension<SessionId>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    let user = match require_authentication(&auth_state, &session_id, uri.path()).await {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };

    render_page(templates.as_ref(), INDEX_TEMPLATE, &json!({ "user": user }))
}
