use std::sync::Arc;

use axum::{extract::Extension, response::Response, Json};

use crate::app::dto::{self, LoginRequest};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Response> {
    let issued = services
        .authenticator
        .login(&body.username, &body.password)
        .await?;
    Ok(dto::ok(issued))
}
