use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use mysql::MysqlError;
use serde::Serialize;
use std::any::Any;

use crate::envelope::Envelope;

const TIMED_OUT: &str = "execution timed out";

/// What a failed script run leaves behind for the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionFailure {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, or -1 when the script was missing, timed out or was killed
    pub returncode: i32,
}

impl ExecutionFailure {
    fn without_output(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            returncode: -1,
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    Execution { msg: String, data: ExecutionFailure },
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Execution { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Maps a failed backup or restore run. `operation` is the capitalized
    /// name used in the message, e.g. `Backup`.
    pub fn from_invocation(operation: &str, err: MysqlError) -> Self {
        match err {
            MysqlError::ScriptFailed {
                stdout,
                stderr,
                code,
            } => ApiError::Execution {
                msg: format!("{operation} failed"),
                data: ExecutionFailure {
                    stdout,
                    stderr,
                    returncode: code,
                },
            },
            MysqlError::TimedOut { .. } => ApiError::Execution {
                msg: format!("{operation} failed: {TIMED_OUT}"),
                data: ExecutionFailure::without_output(TIMED_OUT),
            },
            err @ (MysqlError::ScriptNotFound(_) | MysqlError::Spawn { .. }) => {
                ApiError::Execution {
                    msg: format!("{operation} failed"),
                    data: ExecutionFailure::without_output(err.to_string()),
                }
            }
            other => other.into(),
        }
    }

    /// Maps a failed connectivity probe
    pub fn from_probe(err: MysqlError) -> Self {
        match err {
            MysqlError::ConnectionFailed(_) => ApiError::Internal(err.to_string()),
            MysqlError::TimedOut { .. } => ApiError::Internal("Connection timed out".to_string()),
            MysqlError::ClientNotFound(_) => {
                ApiError::Internal("mysql client not found".to_string())
            }
            other => other.into(),
        }
    }
}

impl From<MysqlError> for ApiError {
    fn from(err: MysqlError) -> Self {
        match err {
            MysqlError::Validation(msg) => ApiError::Validation(msg),
            MysqlError::BackupNotFound(_) => ApiError::NotFound(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Execution { msg, data } => {
                Envelope::new(status, msg, Some(data)).into_response()
            }
            ApiError::Internal(msg) => {
                error!("{msg}");
                Envelope::<()>::new(status, msg, None).into_response()
            }
            ApiError::Validation(msg) | ApiError::NotFound(msg) => {
                Envelope::<()>::new(status, msg, None).into_response()
            }
        }
    }
}

/// Turns a handler panic into a 500 envelope
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    error!("Handler panicked: {detail}");

    Envelope::<()>::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
        None,
    )
    .into_response()
}
