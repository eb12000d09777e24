//! Small helpers for session ids, CSRF tokens and secret comparison.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const TOKEN_BYTES: usize = 32;

/// Create a new opaque session id for the session cookie.
pub(crate) fn generate_session_id() -> Result<String> {
    random_token().context("failed to generate session id")
}

/// Create a new CSRF token for the login form.
pub(crate) fn generate_csrf_token() -> Result<String> {
    random_token().context("failed to generate csrf token")
}

fn random_token() -> Result<String, rand::Error> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Compare two secrets without leaking where they differ or their lengths.
///
/// Both sides are hashed first so the comparison always runs over 32 bytes.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let hash_a = Sha256::digest(a);
    let hash_b = Sha256::digest(b);
    hash_a.as_slice().ct_eq(hash_b.as_slice()).into()
}

/// A submitted CSRF token matches only a non-empty session token.
pub(crate) fn csrf_matches(submitted: &str, expected: &str) -> bool {
    if submitted.is_empty() || expected.is_empty() {
        return false;
    }
    constant_time_eq(submitted.as_bytes(), expected.as_bytes())
}

/// Only same-origin absolute paths are followed after login.
pub(crate) fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\")
}
