use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use workstream_auth::{AuthError, ProvisioningCause, ProvisioningError, RbacError, UserInputError};
use workstream_core::{DomainError, StoreError};

pub type ApiResult<T = Response> = Result<T, ApiError>;

/// Error surfaced by a handler; rendered as `{ "error": code, "message": msg }`.
#[derive(Debug)]
pub enum ApiError {
    Unauthenticated,
    Forbidden(String),
    NotFound,
    Validation(String),
    PermissionNotFound(Vec<String>),
    CatalogEmpty,
    Conflict(String),
    /// Details are logged, never returned.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated => {
                json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "unauthenticated")
            }
            Self::Forbidden(permission) => json_error(
                StatusCode::FORBIDDEN,
                "forbidden",
                format!("missing permission '{permission}'"),
            ),
            Self::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
            Self::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
            Self::PermissionNotFound(missing) => json_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "permission_not_found",
                format!("permissions not found: {}", missing.join(", ")),
            ),
            Self::CatalogEmpty => json_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "catalog_empty",
                "permission catalog is empty",
            ),
            Self::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Backend(msg) => Self::Internal(msg),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Authentication => Self::Unauthenticated,
            AuthError::AuthorizationDenied(permission) => Self::Forbidden(permission),
            AuthError::Backend(e) => e.into(),
            AuthError::Token(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<RbacError> for ApiError {
    fn from(err: RbacError) -> Self {
        match err {
            RbacError::PermissionNotFound { missing } => Self::PermissionNotFound(missing),
            RbacError::NotFound => Self::NotFound,
            RbacError::Validation(e) => e.into(),
            RbacError::Store(e) => e.into(),
        }
    }
}

impl From<ProvisioningError> for ApiError {
    fn from(err: ProvisioningError) -> Self {
        match err {
            ProvisioningError::InvalidRequest(e) => e.into(),
            ProvisioningError::Credential(e) => Self::Internal(e.to_string()),
            ProvisioningError::Failed { cause, step, compensated } => {
                if !compensated {
                    tracing::error!(%step, "provisioning left partial state behind");
                }
                match cause {
                    ProvisioningCause::CatalogEmpty => Self::CatalogEmpty,
                    ProvisioningCause::Store(e) => e.into(),
                    other => Self::Internal(format!("{step}: {other}")),
                }
            }
        }
    }
}

impl From<UserInputError> for ApiError {
    fn from(err: UserInputError) -> Self {
        match err {
            UserInputError::Invalid(e) => e.into(),
            UserInputError::Credential(e) => Self::Internal(e.to_string()),
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use workstream_auth::ProvisioningStep;

    fn status(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn status_mapping() {
        assert_eq!(status(AuthError::Authentication), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(AuthError::AuthorizationDenied("CustomerManagement".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status(StoreError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(StoreError::conflict("dup")), StatusCode::CONFLICT);
        assert_eq!(status(StoreError::backend("boom")), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status(DomainError::validation("bad")), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(RbacError::PermissionNotFound { missing: vec!["X".into()] }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(ProvisioningError::Failed {
                step: ProvisioningStep::ProvisionGrants,
                cause: ProvisioningCause::CatalogEmpty,
                compensated: true,
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(ProvisioningError::Failed {
                step: ProvisioningStep::CreateOwner,
                cause: ProvisioningCause::Store(StoreError::conflict("username taken")),
                compensated: true,
            }),
            StatusCode::CONFLICT
        );
    }
}
