use axum::body::Bytes;
use axum::extract::State;
use axum::response::Response;
use mysql::ConnectionRequest;
use std::sync::Arc;

use super::parse_body;
use crate::envelope;
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /db/test-connection`
pub async fn test_connection(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: ConnectionRequest = parse_body(&body)?;

    let message = state
        .manager
        .test_connection(request)
        .await
        .map_err(ApiError::from_probe)?;

    Ok(envelope::ok_empty(message))
}
