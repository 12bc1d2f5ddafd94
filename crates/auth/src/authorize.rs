use crate::error::AuthError;
use crate::permissions::PermissionName;
use crate::principal::Session;
use crate::resolver::PermissionResolver;
use crate::store::RbacStore;
use crate::token::{extract_bearer, TokenService};

/// Authenticate an `Authorization` header value.
///
/// - No storage access
/// - Expiry always enforced
pub fn authenticate(tokens: &TokenService, header: Option<&str>) -> Result<Session, AuthError> {
    let header = header.ok_or_else(|| {
        tracing::debug!("missing authorization header");
        AuthError::Authentication
    })?;
    tokens.authenticate(extract_bearer(header)?)
}

/// Full request gate: bearer header → verified session → permission check.
///
/// The returned session carries the only tenant scope the request may use.
pub async fn authorize<S: RbacStore>(
    tokens: &TokenService,
    resolver: &PermissionResolver<S>,
    header: Option<&str>,
    required: &PermissionName,
) -> Result<Session, AuthError> {
    let session = authenticate(tokens, header)?;
    resolver.require(&session, required).await?;
    Ok(session)
}
