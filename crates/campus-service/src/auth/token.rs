//! Opaque bearer and activation tokens.
//!
//! Tokens are random bytes handed to the client once; only their SHA-256
//! digest is persisted, so a leaked table cannot be replayed.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use campus_core::constants::TOKEN_BYTES;

/// A freshly issued token and the digest to store for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Value returned to the client.
    pub token: String,
    /// Hex SHA-256 of `token`.
    pub hash: String,
}

/// ## Summary
/// Generates a new random token.
#[must_use]
pub fn issue_token() -> IssuedToken {
    let mut bytes = [0_u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let token = URL_SAFE_NO_PAD.encode(bytes);
    let hash = hash_token(&token);
    IssuedToken { token, hash }
}

/// ## Summary
/// Returns the stored form of a token.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// ## Summary
/// Extracts the token from an `Authorization: Bearer <token>` header value.
#[must_use]
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
