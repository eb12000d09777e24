use axum::response::Redirect;
use tracing::debug;

pub const INDEX_PATH: &str = "/index";

// axum handler for /
pub async fn root() -> Redirect {
    debug!("Root redirect");
    Redirect::to(INDEX_PATH)
}
