use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use workstream_auth::permissions::ORDER_MANAGEMENT;
use workstream_auth::Session;
use workstream_core::OrderId;
use workstream_infra::OrderRepository;
use workstream_sales::{OrderDraft, OrderItemDraft, OrderStatusUpdate, OrderWithItems};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).put(update_order_status))
        .route("/:id/items", get(list_order_items).post(add_order_item))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &ORDER_MANAGEMENT).await?;
    let orders = services.store.orders(&session.scope).await?;
    Ok(dto::list(orders))
}

/// The order with its lines.
pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<OrderId>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &ORDER_MANAGEMENT).await?;
    let order = services.store.order(&session.scope, id).await?;
    let items = services.store.order_items(&session.scope, id).await?;
    Ok(dto::ok(OrderWithItems { order, items }))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Json(body): Json<OrderDraft>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &ORDER_MANAGEMENT).await?;
    let order = services
        .store
        .create_order(
            &session.scope,
            body.customer_id,
            body.order_date_or(Utc::now()),
            body.status(),
        )
        .await?;
    tracing::info!(order_id = %order.id, tenant_id = %order.tenant_id, "order created");
    Ok(dto::created(order))
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<OrderId>,
    Json(body): Json<OrderStatusUpdate>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &ORDER_MANAGEMENT).await?;
    let order = services
        .store
        .update_order_status(&session.scope, id, body.status)
        .await?;
    Ok(dto::ok(order))
}

pub async fn list_order_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<OrderId>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &ORDER_MANAGEMENT).await?;
    let items = services.store.order_items(&session.scope, id).await?;
    Ok(dto::list(items))
}

/// The line price is copied from the item at the time of adding.
pub async fn add_order_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<OrderId>,
    Json(body): Json<OrderItemDraft>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &ORDER_MANAGEMENT).await?;
    let draft = body.validated()?;
    let item = services.store.add_order_item(&session.scope, id, &draft).await?;
    Ok(dto::created(item))
}
