use axum::response::{Html, Response};

use crate::envelope;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health() -> Response {
    envelope::ok_empty("ok")
}
