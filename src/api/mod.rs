use crate::api::{
    handlers::{
        auth::{self, AuthConfig, AuthState, PgCredentialStore},
        health, index, root,
    },
    templates::{Templates, TeraRenderer},
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::get,
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, services::ServeDir, set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;

pub mod handlers;
pub mod templates;

const SESSION_REAPER_INTERVAL: Duration = Duration::from_secs(60);
const STATIC_MOUNT: &str = "/javascript";

/// Where the server finds its templates and static assets.
#[derive(Clone, Debug, Default)]
pub struct Assets {
    pub templates_dir: Option<PathBuf>,
    pub static_dir: PathBuf,
}

/// Build the application router.
///
/// Page routes run behind the session middleware; `/health` and static files
/// do not touch sessions.
pub fn router(auth_state: Arc<AuthState>, templates: Templates, static_dir: &Path) -> Router {
    let pages = Router::new()
        .route("/", get(root::root))
        .route("/index", get(index::index))
        .route("/login", get(auth::login_form).post(auth::login_submit))
        .route("/logout", get(auth::logout))
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth::track_session,
        ));

    pages
        .route("/health", get(health::health))
        .nest_service(STATIC_MOUNT, ServeDir::new(static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(auth_state))
                .layer(Extension(templates)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, auth_config: AuthConfig, assets: Assets) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let templates: Templates = match &assets.templates_dir {
        Some(dir) => Arc::new(
            TeraRenderer::from_dir(dir)
                .with_context(|| format!("Failed to load templates from {}", dir.display()))?,
        ),
        None => Arc::new(TeraRenderer::embedded().context("Failed to load embedded templates")?),
    };

    let auth_state = Arc::new(AuthState::new(
        auth_config,
        Arc::new(PgCredentialStore::new(pool)),
    ));

    // Idle sessions are dropped in the background; lookups also treat them as gone.
    auth::spawn_session_reaper(auth_state.clone(), SESSION_REAPER_INTERVAL);

    let app = router(auth_state, templates, &assets.static_dir);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
