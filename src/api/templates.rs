//! Page rendering.
//!
//! Handlers depend on [`TemplateRenderer`] rather than a global environment so
//! tests and deployments can swap in their own templates.

use serde_json::Value;
use std::{path::Path, sync::Arc};
use tera::{Context, Tera};
use thiserror::Error;

pub const LOGIN_TEMPLATE: &str = "login_greeting.html";
pub const LOGGED_IN_TEMPLATE: &str = "logged_in.html";
pub const LOGOUT_TEMPLATE: &str = "logout_greeting.html";
pub const INDEX_TEMPLATE: &str = "index.html";

const EMBEDDED: [(&str, &str); 4] = [
    (
        LOGIN_TEMPLATE,
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/templates/login_greeting.html"
        )),
    ),
    (
        LOGGED_IN_TEMPLATE,
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/logged_in.html")),
    ),
    (
        LOGOUT_TEMPLATE,
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/templates/logout_greeting.html"
        )),
    ),
    (
        INDEX_TEMPLATE,
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/index.html")),
    ),
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template error: {0}")]
    Tera(#[from] tera::Error),
    #[error("template directory is not valid UTF-8: {0}")]
    InvalidPath(String),
}

pub trait TemplateRenderer: Send + Sync {
    /// Render `name` with a JSON object as context.
    ///
    /// # Errors
    /// Returns an error if the template is unknown, the context is not an object
    /// or rendering fails.
    fn render(&self, name: &str, context: &Value) -> Result<String, TemplateError>;
}

pub type Templates = Arc<dyn TemplateRenderer>;

/// Tera-backed renderer. `.html` templates are auto-escaped.
#[derive(Debug)]
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    /// Templates compiled into the binary.
    ///
    /// # Errors
    /// Returns an error if an embedded template fails to parse.
    pub fn embedded() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(EMBEDDED)?;
        Ok(Self { tera })
    }

    /// Load every `*.html` file under `dir`.
    ///
    /// # Errors
    /// Returns an error if the directory path is not UTF-8 or a template fails to parse.
    pub fn from_dir(dir: &Path) -> Result<Self, TemplateError> {
        let root = dir
            .to_str()
            .ok_or_else(|| TemplateError::InvalidPath(dir.display().to_string()))?;
        let glob = format!("{}/**/*.html", root.trim_end_matches('/'));
        Ok(Self {
            tera: Tera::new(&glob)?,
        })
    }
}

impl TemplateRenderer for TeraRenderer {
    fn render(&self, name: &str, context: &Value) -> Result<String, TemplateError> {
        let context = Context::from_serialize(context)?;
        Ok(self.tera.render(name, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embedded_login_form_carries_csrf_token() -> Result<(), TemplateError> {
        let renderer = TeraRenderer::embedded()?;
        let html = renderer.render(LOGIN_TEMPLATE, &json!({ "_csrf": "token-123" }))?;
        assert!(html.contains(r#"name="_csrf" value="token-123""#));
        assert!(html.contains(r#"action="/login""#));
        Ok(())
    }

    #[test]
    fn embedded_templates_escape_user_input() -> Result<(), TemplateError> {
        let renderer = TeraRenderer::embedded()?;
        let html = renderer.render(LOGGED_IN_TEMPLATE, &json!({ "user": "<b>eve</b>" }))?;
        assert!(html.contains("&lt;b&gt;eve&lt;&#x2F;b&gt;"));
        assert!(!html.contains("<b>eve</b>"));
        Ok(())
    }

    #[test]
    fn embedded_index_binds_user() -> Result<(), TemplateError> {
        let renderer = TeraRenderer::embedded()?;
        let html = renderer.render(INDEX_TEMPLATE, &json!({ "user": "alice" }))?;
        assert!(html.contains("alice"));
        Ok(())
    }

    #[test]
    fn unknown_template_is_an_error() -> Result<(), TemplateError> {
        let renderer = TeraRenderer::embedded()?;
        assert!(renderer.render("missing.html", &json!({})).is_err());
        Ok(())
    }

    #[test]
    fn non_object_context_is_an_error() -> Result<(), TemplateError> {
        let renderer = TeraRenderer::embedded()?;
        assert!(renderer.render(LOGOUT_TEMPLATE, &json!(["not", "an", "object"])).is_err());
        Ok(())
    }
}
