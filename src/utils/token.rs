//! API token generation and hashing.
//!
//! Shared by the server (authentication) and the `admin` binary (token
//! creation), so both sides always agree on the stored hash.

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of generated tokens.
pub const TOKEN_LEN: usize = 48;

/// Generates a cryptographically random token.
///
/// # Format
///
/// - Length: 48 characters
/// - Character set: A-Z, a-z, 0-9
/// - Entropy: ~286 bits
pub fn generate_token() -> String {
    let mut rng = rand::rng();

    (0..TOKEN_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Hashes a raw token with HMAC-SHA256 keyed by the signing secret.
///
/// Returns a 64-character lowercase hex-encoded MAC. A database dump alone is
/// not enough to verify or forge tokens.
///
/// ```
/// use stem_cms::utils::token::hash_token;
///
/// let hash = hash_token("secret", "abc");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, hash_token("secret", "abc"));
/// ```
pub fn hash_token(signing_secret: &str, token: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
