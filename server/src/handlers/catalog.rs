use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use mysql::{BackupEntry, LogKind, MysqlManager};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task;

use crate::envelope;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub database: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BackupListing {
    pub items: Vec<BackupEntry>,
    pub total: usize,
}

/// Runs a filesystem operation on the blocking pool
async fn blocking<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&MysqlManager) -> mysql::Result<T> + Send + 'static,
{
    let manager = state.manager.clone();
    task::spawn_blocking(move || op(&manager))
        .await
        .map_err(|e| ApiError::Internal(format!("Filesystem task failed: {e}")))?
        .map_err(ApiError::from)
}

fn query_error(rejection: QueryRejection) -> ApiError {
    ApiError::Validation(rejection.body_text())
}

/// `GET /db/backups?database=`
pub async fn list_backups(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(query_error)?;

    let items = blocking(&state, move |manager| {
        manager.list_backups(query.database.as_deref())
    })
    .await?;

    let total = items.len();
    Ok(envelope::ok("ok", BackupListing { items, total }))
}

/// `GET /db/backups/{dir_name}/log?type=backup|restore`
pub async fn backup_log(
    State(state): State<Arc<AppState>>,
    Path(dir_name): Path<String>,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(query_error)?;
    // The type is checked before the directory name
    let kind: LogKind = query.kind.as_deref().unwrap_or("backup").parse()?;

    let log = blocking(&state, move |manager| manager.read_log(&dir_name, kind)).await?;
    Ok(envelope::ok("ok", log))
}

/// `GET /db/backups/{dir_name}/tables`
pub async fn backup_tables(
    State(state): State<Arc<AppState>>,
    Path(dir_name): Path<String>,
) -> Result<Response, ApiError> {
    let listing = blocking(&state, move |manager| manager.list_tables(&dir_name)).await?;
    Ok(envelope::ok("ok", listing))
}

/// `DELETE /db/backups/{dir_name}`
pub async fn delete_backup(
    State(state): State<Arc<AppState>>,
    Path(dir_name): Path<String>,
) -> Result<Response, ApiError> {
    blocking(&state, move |manager| manager.delete_backup(&dir_name)).await?;
    Ok(envelope::ok_empty("Deleted"))
}
