//! Permission guard used by handlers before they touch tenant data.

use workstream_auth::{PermissionName, Session};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub async fn require(
    services: &AppServices,
    session: &Session,
    permission: &PermissionName,
) -> Result<(), ApiError> {
    services
        .resolver
        .require(session, permission)
        .await
        .map_err(ApiError::from)
}
