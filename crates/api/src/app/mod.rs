use std::sync::Arc;

use axum::{Extension, Router};

use workstream_core::StoreResult;

use crate::config::AppConfig;
use crate::middleware::{self, AuthState};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{build_services, AppServices};

/// Open storage as configured and build the full router.
pub async fn build_app(config: &AppConfig) -> StoreResult<Router> {
    let services = build_services(config).await?;
    Ok(router(Arc::new(services)))
}

/// Public routes plus the token-protected tree.
pub fn router(services: Arc<AppServices>) -> Router {
    let auth_state = AuthState {
        tokens: services.tokens.clone(),
    };

    let protected = routes::router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    routes::public_router()
        .layer(Extension(services))
        .merge(protected)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    async fn app() -> Router {
        let mut config = AppConfig::in_memory("router-test-secret");
        config.password_cost = Some(4);
        build_app(&config).await.unwrap()
    }

    fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().uri(uri);
        if let Some(auth) = auth {
            req = req.header(header::AUTHORIZATION, auth);
        }
        req.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_needs_no_token() {
        let res = app().await.oneshot(get("/health", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_reject_missing_and_malformed_tokens() {
        for auth in [None, Some("Bearer "), Some("Basic abc"), Some("Bearer not-a-jwt")] {
            let res = app().await.oneshot(get("/customers", auth)).await.unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{auth:?}");
        }
    }

    #[tokio::test]
    async fn permission_catalog_is_seeded_at_startup() {
        let services = build_services(&AppConfig::in_memory("s")).await.unwrap();
        let catalog = services.resolver.list_permissions().await.unwrap();
        assert_eq!(catalog.len(), workstream_auth::DEFAULT_CATALOG.len());
    }
}
