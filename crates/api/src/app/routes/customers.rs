use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::Response,
    routing::get,
    Json, Router,
};

use workstream_auth::permissions::CUSTOMER_MANAGEMENT;
use workstream_auth::Session;
use workstream_core::CustomerId;
use workstream_infra::CustomerRepository;
use workstream_parties::{CustomerDraft, CustomerPatch};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &CUSTOMER_MANAGEMENT).await?;
    let customers = services.store.customers(&session.scope).await?;
    Ok(dto::list(customers))
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<CustomerId>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &CUSTOMER_MANAGEMENT).await?;
    let customer = services.store.customer(&session.scope, id).await?;
    Ok(dto::ok(customer))
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Json(body): Json<CustomerDraft>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &CUSTOMER_MANAGEMENT).await?;
    let draft = body.validated()?;
    let customer = services.store.create_customer(&session.scope, &draft).await?;
    Ok(dto::created(customer))
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<CustomerId>,
    Json(body): Json<CustomerPatch>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &CUSTOMER_MANAGEMENT).await?;
    let patch = body.validated()?;
    let customer = services.store.update_customer(&session.scope, id, &patch).await?;
    Ok(dto::ok(customer))
}

/// Soft delete; the customer disappears from every read.
pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<Session>,
    Path(id): Path<CustomerId>,
) -> ApiResult<Response> {
    authz::require(&services, &session, &CUSTOMER_MANAGEMENT).await?;
    services.store.delete_customer(&session.scope, id).await?;
    Ok(dto::no_content())
}
