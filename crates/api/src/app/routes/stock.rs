use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::Response,
    routing::get,
    Json, Router,
};

use workstream_auth::permissions::INVENTORY_MANAGEMENT;
use workstream_auth::Session;
use workstream_core::StockId;
use workstream_infra::StockRepository;
use workstream_inventory::{StockDraft, StockPatch};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_stock).post(create_stock))
        .route("/:id", get(get_stock).put(update_stock).delete(delete_stock))
}

pub async fn list_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &INVENTORY_MANAGEMENT).await?;
    let stock = services.store.all_stock(&session.scope).await?;
    Ok(dto::list(stock))
}

pub async fn get_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<StockId>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &INVENTORY_MANAGEMENT).await?;
    let stock = services.store.stock(&session.scope, id).await?;
    Ok(dto::ok(stock))
}

pub async fn create_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Json(body): Json<StockDraft>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &INVENTORY_MANAGEMENT).await?;
    let draft = body.validated()?;
    let stock = services.store.create_stock(&session.scope, &draft).await?;
    Ok(dto::created(stock))
}

/// Date rules are checked against the merged record, so the current row is
/// read first.
pub async fn update_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<StockId>,
    Json(body): Json<StockPatch>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &INVENTORY_MANAGEMENT).await?;
    let current = services.store.stock(&session.scope, id).await?;
    let patch = body.validated_for(&current.stock)?;
    let stock = services.store.update_stock(&session.scope, id, &patch).await?;
    Ok(dto::ok(stock))
}

pub async fn delete_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<StockId>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &INVENTORY_MANAGEMENT).await?;
    services.store.delete_stock(&session.scope, id).await?;
    Ok(dto::no_content())
}
