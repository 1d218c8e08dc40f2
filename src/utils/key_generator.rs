//! Random keys for stored media files.

use crate::error::AppError;
use base64::Engine as _;
use serde_json::json;

/// Length of random bytes before base64 encoding.
const KEY_LENGTH_BYTES: usize = 12;

/// Generates a URL-safe random key for an uploaded file.
///
/// Uses `getrandom` for entropy and encodes the result as URL-safe base64
/// without padding, producing a 16-character key.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random number generator fails.
pub fn generate_media_key() -> Result<String, AppError> {
    let mut buffer = [0u8; KEY_LENGTH_BYTES];

    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate random bytes",
            json!({ "reason": e.to_string() }),
        )
    })?;

    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
}
