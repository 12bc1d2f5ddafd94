use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use workstream_core::{PermissionId, RoleId, TenantId};

/// Permission name as used by callers (e.g. `"CustomerManagement"`).
///
/// Names are free-form and matched case-sensitively against the global
/// catalog. Once resolved, grants reference permissions by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionName(Cow<'static, str>);

impl PermissionName {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PermissionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PermissionName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const CUSTOMER_MANAGEMENT: PermissionName = PermissionName::from_static("CustomerManagement");
pub const INVENTORY_MANAGEMENT: PermissionName = PermissionName::from_static("InventoryManagement");
pub const ORDER_MANAGEMENT: PermissionName = PermissionName::from_static("OrderManagement");
pub const ROLE_MANAGEMENT: PermissionName = PermissionName::from_static("RoleManagement");
pub const TENANT_MANAGEMENT: PermissionName = PermissionName::from_static("TenantManagement");
pub const USER_MANAGEMENT: PermissionName = PermissionName::from_static("UserManagement");

/// Catalog seeded at startup when no other catalog is configured.
pub const DEFAULT_CATALOG: [PermissionName; 6] = [
    CUSTOMER_MANAGEMENT,
    INVENTORY_MANAGEMENT,
    ORDER_MANAGEMENT,
    ROLE_MANAGEMENT,
    TENANT_MANAGEMENT,
    USER_MANAGEMENT,
];

/// Catalog entry. Global: shared by every tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
}

/// Grant of a permission to a role within a tenant.
///
/// Keyed by `(role_id, permission_id, tenant_id)`. The grant is only valid
/// while `tenant_id` equals the tenant of the role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RolePermission {
    pub role_id: RoleId,
    pub permission_id: PermissionId,
    pub tenant_id: TenantId,
}

/// Deduplicate requested names, keeping first-seen order.
pub fn normalize_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .map(|n| n.as_ref().to_string())
        .filter(|n| seen.insert(n.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_order_and_case() {
        let names = normalize_names(&["UserManagement", "usermanagement", "UserManagement"]);
        assert_eq!(names, vec!["UserManagement", "usermanagement"]);
    }

    #[test]
    fn default_catalog_is_unique() {
        let catalog = DEFAULT_CATALOG;
        let names: Vec<&str> = catalog.iter().map(|p| p.as_str()).collect();
        assert_eq!(normalize_names(&names).len(), DEFAULT_CATALOG.len());
    }
}
