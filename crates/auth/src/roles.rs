use serde::{Deserialize, Serialize};

use workstream_core::{validate, DomainResult, RoleId, TenantId};

pub const OWNER: &str = "Owner";
pub const ADMIN: &str = "Admin";
pub const MANAGER: &str = "Manager";
pub const USER: &str = "User";
pub const GUEST: &str = "Guest";

/// Roles created for every new tenant. `Owner` receives the full catalog.
pub const DEFAULT_ROLES: [&str; 5] = [OWNER, ADMIN, MANAGER, USER, GUEST];

/// Role scoped to exactly one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub tenant_id: TenantId,
}

/// Role together with the names of the permissions granted to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleWithPermissions {
    pub id: RoleId,
    pub name: String,
    pub permission_names: Vec<String>,
}

impl RoleWithPermissions {
    pub fn new(role: &Role, mut permission_names: Vec<String>) -> Self {
        permission_names.sort();
        Self {
            id: role.id,
            name: role.name.clone(),
            permission_names,
        }
    }
}

pub fn validate_role_name(name: &str) -> DomainResult<String> {
    validate::non_empty("role name", name)
}
