use axum::body::Bytes;
use axum::extract::State;
use axum::response::Response;
use mysql::{BackupRequest, RestoreRequest};
use std::sync::Arc;

use super::parse_body;
use crate::envelope;
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /db/backup`; blocks until the script exits or is killed
pub async fn backup(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: BackupRequest = parse_body(&body)?;

    let report = state
        .manager
        .backup(request)
        .await
        .map_err(|e| ApiError::from_invocation("Backup", e))?;

    Ok(envelope::ok("Backup succeeded", report))
}

/// `POST /db/restore`
pub async fn restore(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: RestoreRequest = parse_body(&body)?;

    let report = state
        .manager
        .restore(request)
        .await
        .map_err(|e| ApiError::from_invocation("Restore", e))?;

    Ok(envelope::ok("Restore succeeded", report))
}
