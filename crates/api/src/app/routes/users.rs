use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::Response,
    routing::get,
    Json, Router,
};

use workstream_auth::permissions::USER_MANAGEMENT;
use workstream_auth::{Session, UserDraft, UserPatch};
use workstream_core::UserId;
use workstream_infra::UserRepository;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &USER_MANAGEMENT).await?;
    let users = services.store.users(&session.scope).await?;
    Ok(dto::list(users))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<UserId>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &USER_MANAGEMENT).await?;
    let user = services.store.user(&session.scope, id).await?;
    Ok(dto::ok(user))
}

/// The new user lands in the caller's tenant; a role id must name one of
/// that tenant's roles.
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Json(body): Json<UserDraft>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &USER_MANAGEMENT).await?;
    let new_user = body.into_new_user(&services.hasher)?;
    let user = services.store.create_user(&session.scope, &new_user).await?;
    tracing::info!(user_id = %user.id, tenant_id = %user.tenant_id, "user created");
    Ok(dto::created(user))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<UserId>,
    Json(body): Json<UserPatch>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &USER_MANAGEMENT).await?;
    let changes = body.into_changes(&services.hasher)?;
    let user = services.store.update_user(&session.scope, id, &changes).await?;
    Ok(dto::ok(user))
}
