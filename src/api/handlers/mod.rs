//! Route handlers and the helpers they share.

pub mod auth;
pub mod health;
pub mod index;
pub mod root;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde_json::Value;
use tracing::error;

use crate::api::templates::TemplateRenderer;

/// Render a page, or answer 500 without leaking the template error.
pub(crate) fn render_page(templates: &dyn TemplateRenderer, name: &str, context: &Value) -> Response {
    match templates.render(name, context) {
        Ok(body) => Html(body).into_response(),
        Err(err) => {
            error!("Failed to render {name}: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
