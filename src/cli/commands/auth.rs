use clap::{Arg, ArgAction, ArgMatches, Command};

pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_CREDENTIAL_LOOKUP_TIMEOUT_SECONDS: &str = "credential-lookup-timeout-seconds";
pub const ARG_SESSION_COOKIE_SECURE: &str = "session-cookie-secure";

#[derive(Debug, Clone)]
pub struct Options {
    pub session_ttl_seconds: u64,
    pub credential_lookup_timeout_seconds: u64,
    pub session_cookie_secure: bool,
}

impl Options {
    /// Parse session and login arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a value is out of range.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let session_ttl_seconds = matches
            .get_one::<u64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(900);
        let credential_lookup_timeout_seconds = matches
            .get_one::<u64>(ARG_CREDENTIAL_LOOKUP_TIMEOUT_SECONDS)
            .copied()
            .unwrap_or(5);

        if session_ttl_seconds == 0 {
            anyhow::bail!("--{ARG_SESSION_TTL_SECONDS} must be greater than zero");
        }
        if credential_lookup_timeout_seconds == 0 {
            anyhow::bail!("--{ARG_CREDENTIAL_LOOKUP_TIMEOUT_SECONDS} must be greater than zero");
        }

        Ok(Self {
            session_ttl_seconds,
            credential_lookup_timeout_seconds,
            session_cookie_secure: matches.get_flag(ARG_SESSION_COOKIE_SECURE),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Idle time in seconds before a session expires")
                .env("MUET_SESSION_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_CREDENTIAL_LOOKUP_TIMEOUT_SECONDS)
                .long(ARG_CREDENTIAL_LOOKUP_TIMEOUT_SECONDS)
                .help("Seconds to wait for the credential store before rejecting a login")
                .env("MUET_CREDENTIAL_LOOKUP_TIMEOUT_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_SESSION_COOKIE_SECURE)
                .long(ARG_SESSION_COOKIE_SECURE)
                .help("Mark the session cookie Secure (serve over HTTPS)")
                .env("MUET_SESSION_COOKIE_SECURE")
                .action(ArgAction::SetTrue),
        )
}
