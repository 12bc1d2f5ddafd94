use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use workstream_auth::TokenService;

use crate::app::errors::ApiError;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
}

/// Verify the bearer token and attach the resulting `Session` to the request.
///
/// Handlers read the tenant scope from that session only; nothing in the
/// request body or path can widen it.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    // A header that is not visible ASCII is treated like a missing one.
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match workstream_auth::authenticate(&state.tokens, header) {
        Ok(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}
