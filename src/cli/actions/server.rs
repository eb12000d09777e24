use crate::api::{self, handlers::auth::AuthConfig, Assets};
use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub templates_dir: Option<PathBuf>,
    pub static_dir: PathBuf,
    pub session_ttl_seconds: u64,
    pub credential_lookup_timeout_seconds: u64,
    pub session_cookie_secure: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable, templates fail to load or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new()
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_credential_lookup_timeout_seconds(args.credential_lookup_timeout_seconds)
        .with_session_cookie_secure(args.session_cookie_secure);

    debug!("Auth config: {:?}", auth_config);

    let assets = Assets {
        templates_dir: args.templates_dir,
        static_dir: args.static_dir,
    };

    api::new(args.port, args.dsn, auth_config, assets).await
}
