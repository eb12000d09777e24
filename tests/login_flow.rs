#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Request, Response, StatusCode,
    },
    Router,
};
use muet::api::{
    handlers::auth::{AuthConfig, AuthState, MemoryCredentialStore},
    router,
    templates::{Templates, TeraRenderer},
};
use std::{path::Path, sync::Arc};
use tower::ServiceExt;

fn app(config: AuthConfig) -> Result<Router> {
    let store = MemoryCredentialStore::new()
        .with_user("alice", "secret")
        .with_user("bob", "hunter2");
    let auth_state = Arc::new(AuthState::new(config, Arc::new(store)));
    let templates: Templates = Arc::new(TeraRenderer::embedded()?);
    let static_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("javascript");
    Ok(router(auth_state, templates, &static_dir))
}

fn get(uri: &str, cookie: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    Ok(builder.body(Body::empty())?)
}

fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn text(response: Response<Body>) -> Result<String> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

fn csrf_token(html: &str) -> Result<String> {
    let marker = r#"name="_csrf" value=""#;
    let start = html.find(marker).context("csrf field")? + marker.len();
    let end = html[start..].find('"').context("csrf value")?;
    Ok(html[start..start + end].to_string())
}

/// Visit `/index`, follow the redirect to `/login`, and log in.
async fn log_in(app: &Router, username: &str, password: &str) -> Result<(String, Response<Body>)> {
    let response = app.clone().oneshot(get("/index", None)?).await?;
    let cookie = set_cookie(&response)
        .and_then(|header| header.split(';').next().map(str::to_string))
        .context("session cookie")?;

    let form = app.clone().oneshot(get("/login", Some(&cookie))?).await?;
    let token = csrf_token(&text(form).await?)?;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(COOKIE, &cookie)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!(
                    "username={username}&password={password}&_csrf={token}"
                )))?,
        )
        .await?;
    Ok((cookie, response))
}

#[tokio::test]
async fn full_login_and_logout_cycle() -> Result<()> {
    let app = app(AuthConfig::new())?;

    let (cookie, response) = log_in(&app, "bob", "hunter2").await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
        Some("/index")
    );

    let index = app.clone().oneshot(get("/index", Some(&cookie))?).await?;
    assert_eq!(index.status(), StatusCode::OK);
    assert!(text(index).await?.contains("Welcome, bob"));

    let logout = app.clone().oneshot(get("/logout", Some(&cookie))?).await?;
    assert_eq!(logout.status(), StatusCode::OK);
    assert!(set_cookie(&logout).is_some_and(|c| c.contains("Max-Age=0")));
    assert!(text(logout).await?.contains("logged out"));

    let index = app.oneshot(get("/index", Some(&cookie))?).await?;
    assert_eq!(index.status(), StatusCode::SEE_OTHER);
    Ok(())
}

#[tokio::test]
async fn wrong_password_returns_to_login() -> Result<()> {
    let app = app(AuthConfig::new())?;

    let (cookie, response) = log_in(&app, "alice", "nope").await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
        Some("/login")
    );

    let index = app.oneshot(get("/index", Some(&cookie))?).await?;
    assert_eq!(index.status(), StatusCode::SEE_OTHER);
    Ok(())
}

#[tokio::test]
async fn secure_cookie_when_configured() -> Result<()> {
    let app = app(AuthConfig::new().with_session_cookie_secure(true))?;

    let response = app.oneshot(get("/login", None)?).await?;
    let cookie = set_cookie(&response).context("session cookie")?;
    assert!(cookie.starts_with("muet_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Secure"));
    Ok(())
}

#[tokio::test]
async fn static_script_is_served_without_session() -> Result<()> {
    let app = app(AuthConfig::new())?;

    let response = app.oneshot(get("/javascript/app.js", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).is_none());
    assert!(text(response).await?.contains("DOMContentLoaded"));
    Ok(())
}

#[tokio::test]
async fn health_is_public() -> Result<()> {
    let app = app(AuthConfig::new())?;

    let response = app.oneshot(get("/health", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(set_cookie(&response).is_none());
    Ok(())
}
