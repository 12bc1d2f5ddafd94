use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
    routing::get,
    Json, Router,
};

use workstream_auth::permissions::INVENTORY_MANAGEMENT;
use workstream_auth::Session;
use workstream_core::InventoryItemId;
use workstream_infra::{InventoryRepository, StockRepository};
use workstream_inventory::{InventoryItemDraft, InventoryItemPatch};

use crate::app::dto::{self, SearchQuery};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/search", get(search_items))
        .route(
            "/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/items/:id/stock", get(item_stock))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &INVENTORY_MANAGEMENT).await?;
    let items = services.store.items(&session.scope).await?;
    Ok(dto::list(items))
}

/// `?name=` matches case-insensitively anywhere in the item name.
pub async fn search_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &INVENTORY_MANAGEMENT).await?;
    let items = services.store.search_items(&session.scope, query.name.trim()).await?;
    Ok(dto::list(items))
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<InventoryItemId>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &INVENTORY_MANAGEMENT).await?;
    let item = services.store.item(&session.scope, id).await?;
    Ok(dto::ok(item))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Json(body): Json<InventoryItemDraft>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &INVENTORY_MANAGEMENT).await?;
    let draft = body.validated()?;
    let item = services.store.create_item(&session.scope, &draft).await?;
    Ok(dto::created(item))
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<InventoryItemId>,
    Json(body): Json<InventoryItemPatch>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &INVENTORY_MANAGEMENT).await?;
    let patch = body.validated()?;
    let item = services.store.update_item(&session.scope, id, &patch).await?;
    Ok(dto::ok(item))
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<InventoryItemId>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &INVENTORY_MANAGEMENT).await?;
    services.store.delete_item(&session.scope, id).await?;
    Ok(dto::no_content())
}

pub async fn item_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<InventoryItemId>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &INVENTORY_MANAGEMENT).await?;
    let stock = services.store.stock_for_item(&session.scope, id).await?;
    Ok(dto::list(stock))
}
