use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::Response,
    routing::get,
    Json, Router,
};

use workstream_auth::permissions::ROLE_MANAGEMENT;
use workstream_auth::Session;
use workstream_core::{PermissionId, RoleId};

use crate::app::dto::{self, CreateRoleRequest, UpdateRoleRequest};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::authz;

pub fn roles_router() -> Router {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/with-permissions", get(list_roles_with_permissions))
        .route("/:id", get(get_role).put(update_role))
}

/// The catalog is global and readable by any authenticated caller.
pub fn permissions_router() -> Router {
    Router::new()
        .route("/", get(list_permissions))
        .route("/:id", get(get_permission))
}

pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &ROLE_MANAGEMENT).await?;
    let roles = services.resolver.roles(&session.scope).await?;
    Ok(dto::list(roles))
}

pub async fn list_roles_with_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &ROLE_MANAGEMENT).await?;
    let roles = services.resolver.roles_with_permissions(&session.scope).await?;
    Ok(dto::list(roles))
}

pub async fn get_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<RoleId>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &ROLE_MANAGEMENT).await?;
    let role = services.resolver.role_with_permissions(&session.scope, id).await?;
    Ok(dto::ok(role))
}

pub async fn create_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Json(body): Json<CreateRoleRequest>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &ROLE_MANAGEMENT).await?;
    let role = services
        .resolver
        .create_role(&session.scope, &body.name, body.permission_names.as_slice())
        .await?;
    Ok(dto::created(role))
}

/// Rename and replace the grant set in one unit.
pub async fn update_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<RoleId>,
    Json(body): Json<UpdateRoleRequest>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &ROLE_MANAGEMENT).await?;
    let role = services
        .resolver
        .update_role(&session.scope, id, body.name.as_deref(), body.permission_names.as_slice())
        .await?;
    Ok(dto::ok(role))
}

pub async fn list_permissions(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Response> {
    let permissions = services.resolver.list_permissions().await?;
    Ok(dto::list(permissions))
}

pub async fn get_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<PermissionId>,
) -> ApiResult<Response> {
    let permission = services.resolver.permission_by_id(id).await?;
    Ok(dto::ok(permission))
}
