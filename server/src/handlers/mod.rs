pub mod catalog;
pub mod connection;
pub mod general;
pub mod invocation;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Decodes a JSON request body. An empty body or `null` is treated as an
/// empty object so the request reaches field validation.
pub(crate) fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice::<Option<T>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|e| ApiError::Validation(format!("Invalid JSON body: {e}")))
}
