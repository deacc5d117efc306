use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use log::info;
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;

use crate::envelope::Envelope;
use crate::error::handle_panic;
use crate::handlers::{catalog, connection, general, invocation};
use crate::state::AppState;

/// Builds the full HTTP surface
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(general::index))
        .route("/health", get(general::health))
        .route("/db/test-connection", post(connection::test_connection))
        .route("/db/backup", post(invocation::backup))
        .route("/db/restore", post(invocation::restore))
        .route("/db/backups", get(catalog::list_backups))
        .route("/db/backups/:dir_name", delete(catalog::delete_backup))
        .route("/db/backups/:dir_name/log", get(catalog::backup_log))
        .route("/db/backups/:dir_name/tables", get(catalog::backup_tables))
        .fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(log_request))
}

async fn not_found() -> Response {
    Envelope::<()>::new(StatusCode::NOT_FOUND, "Not found", None).into_response()
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        "{method} {path} -> {} ({:?})",
        response.status().as_u16(),
        started.elapsed()
    );
    response
}
