use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Body of every JSON response: `{code, msg, data}`.
///
/// `code` always equals the HTTP status of the response, and `data` is
/// serialized as `null` when there is nothing to return.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub code: u16,
    pub msg: String,
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(status: StatusCode, msg: impl Into<String>, data: Option<T>) -> Self {
        Self {
            code: status.as_u16(),
            msg: msg.into(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// 200 response carrying `data`
pub fn ok<T: Serialize>(msg: impl Into<String>, data: T) -> Response {
    Envelope::new(StatusCode::OK, msg, Some(data)).into_response()
}

/// 200 response with `data: null`
pub fn ok_empty(msg: impl Into<String>) -> Response {
    Envelope::<()>::new(StatusCode::OK, msg, None).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_data_serializes_as_null() {
        let envelope = Envelope::<()>::new(StatusCode::NOT_FOUND, "Not found", None);
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            serde_json::json!({"code": 404, "msg": "Not found", "data": null})
        );
    }
}
