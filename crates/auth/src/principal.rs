use chrono::{DateTime, Utc};
use serde::Serialize;

use workstream_core::{RoleId, TenantId, UserId};

/// Proof that a tenant id came out of a verified session token.
///
/// Only the token service can construct one, so every tenant-scoped
/// repository call that takes a `&TenantScope` is filtered by the caller's
/// own tenant and never by a value read from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TenantScope {
    tenant_id: TenantId,
}

impl TenantScope {
    pub(crate) fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// A verified caller, produced once per request by
/// [`crate::TokenService::authenticate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: UserId,
    pub username: String,
    pub role_name: String,
    pub role_id: Option<RoleId>,
    pub scope: TenantScope,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn tenant_id(&self) -> TenantId {
        self.scope.tenant_id()
    }

    pub fn is_guest(&self) -> bool {
        self.role_id.is_none()
    }
}
