use axum::http::HeaderMap;

use crate::error::AppError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Shared-secret gate applied at the top of every handler. When a secret is
/// configured, a missing or mismatched `X-API-Key` header is rejected.
pub fn require_api_key(expected: Option<&str>, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let provided = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    if provided != Some(expected) {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}
