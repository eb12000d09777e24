//! # Muet (session login gate)
//!
//! `muet` puts a login form in front of a small set of server-rendered pages.
//! Visitors are tracked with an opaque session cookie; the session remembers who
//! is logged in, the CSRF token of the last rendered login form and the page the
//! visitor wanted before being sent to `/login`.
//!
//! ## Login protocol
//!
//! - `GET /login` issues a fresh CSRF token and renders the form.
//! - `POST /login` checks the token before anything else. Only then is the
//!   credential store queried; the lookup is the single suspension point of the
//!   flow and is bounded by a timeout.
//! - Every failure (bad token, unknown user, wrong password, store error) answers
//!   with the same redirect to `/login`, so callers cannot tell which check
//!   failed. Causes only show up in the logs.
//!
//! ## Protected pages
//!
//! Handlers call [`api::handlers::auth::require_authentication`]. Anonymous
//! visitors get redirected to `/login` and come back to the original path after
//! a successful login.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
