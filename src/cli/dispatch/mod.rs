use crate::cli::{
    actions::{server, Action},
    commands::{assets, auth},
};
use anyhow::Result;

/// Turn parsed arguments into the action to run.
///
/// # Errors
/// Returns an error if a required argument is missing or a value is out of range.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let auth = auth::Options::parse(matches)?;
    let assets = assets::Options::parse(matches);

    Ok(Action::Server(server::Args {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        dsn: matches
            .get_one("dsn")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --dsn"))?,
        templates_dir: assets.templates_dir,
        static_dir: assets.static_dir,
        session_ttl_seconds: auth.session_ttl_seconds,
        credential_lookup_timeout_seconds: auth.credential_lookup_timeout_seconds,
        session_cookie_secure: auth.session_cookie_secure,
    }))
}
