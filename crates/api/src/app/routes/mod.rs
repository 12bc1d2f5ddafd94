use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod customers;
pub mod inventory;
pub mod orders;
pub mod rbac;
pub mod stock;
pub mod system;
pub mod tenants;
pub mod users;

/// Endpoints reachable without a session token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/login", post(auth::login))
        .route("/tenants", post(tenants::provision))
}

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route(
            "/tenants/current",
            get(tenants::current)
                .put(tenants::update_current)
                .delete(tenants::delete_current),
        )
        .nest("/roles", rbac::roles_router())
        .nest("/permissions", rbac::permissions_router())
        .nest("/users", users::router())
        .nest("/customers", customers::router())
        .nest("/inventory", inventory::router())
        .nest("/stock", stock::router())
        .nest("/orders", orders::router())
}
