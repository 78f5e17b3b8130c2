//! Token id generation and syntax checks.
//!
//! Ids are 16 bytes from the OS CSPRNG, encoded as URL-safe base64 without
//! padding. They are never checked against the store before insert; a collision
//! surfaces as a unique violation on `tokens.token_id`.

use base64::Engine as _;
use regex::Regex;
use std::sync::LazyLock;

/// Random bytes per token id (128 bits of entropy).
const TOKEN_ID_BYTES: usize = 16;

/// Shape of any id this service could have issued. Anything else is rejected
/// without a store lookup.
static TOKEN_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{16,128}$").expect("valid token id regex"));

/// Generates a cryptographically random, URL-safe token id.
///
/// Produces a 22-character string over `[A-Za-z0-9_-]`.
///
/// # Panics
///
/// Panics if the system random number generator fails (extremely rare).
///
/// # Examples
///
/// ```ignore
/// let id = generate_token_id();
/// assert_eq!(id.len(), 22);
/// ```
pub fn generate_token_id() -> String {
    let mut buffer = [0u8; TOKEN_ID_BYTES];

    getrandom::fill(&mut buffer).expect("Failed to generate random bytes");

    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer)
}

/// Returns true if `token_id` has the shape of an issued id.
pub fn is_well_formed_token_id(token_id: &str) -> bool {
    TOKEN_ID_REGEX.is_match(token_id)
}
