use std::sync::Arc;

use axum::{extract::Extension, response::Response, Json};

use workstream_auth::permissions::TENANT_MANAGEMENT;
use workstream_auth::{ProvisionRequest, Session, TenantPatch};
use workstream_infra::TenantDirectory;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::authz;

/// Create a tenant with its default roles and owner account.
pub async fn provision(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<ProvisionRequest>,
) -> ApiResult<Response> {
    let provisioned = services.provisioner.provision(&body).await?;
    Ok(dto::created(provisioned))
}

pub async fn current(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
) -> ApiResult<Response> {
    let tenant = services.store.tenant(&session.scope).await?;
    Ok(dto::ok(tenant))
}

pub async fn update_current(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Json(body): Json<TenantPatch>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &TENANT_MANAGEMENT).await?;
    let patch = body.validated()?;
    let tenant = services.store.update_tenant(&session.scope, &patch).await?;
    Ok(dto::ok(tenant))
}

/// Remove the caller's tenant and everything it owns. Tokens issued for it
/// keep verifying until they expire but every lookup comes back empty.
pub async fn delete_current(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &TENANT_MANAGEMENT).await?;
    services.store.delete_tenant(&session.scope).await?;
    tracing::info!(tenant_id = %session.tenant_id(), "tenant deleted");
    Ok(dto::no_content())
}
