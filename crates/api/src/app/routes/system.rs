use axum::{extract::Extension, http::StatusCode, response::Response};

use workstream_auth::Session;

use crate::app::dto;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// The verified session behind the presented token.
pub async fn whoami(Extension(session): Extension<Session>) -> Response {
    dto::ok(session)
}
