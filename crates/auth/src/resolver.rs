//! Role → permission resolution and the grant writer path.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::instrument;

use workstream_core::{PermissionId, RoleId, StoreError, StoreResult, TenantId};

use crate::error::{AuthError, RbacError};
use crate::permissions::{normalize_names, Permission, PermissionName};
use crate::principal::{Session, TenantScope};
use crate::roles::{validate_role_name, Role, RoleWithPermissions};
use crate::store::RbacStore;

/// Answers "may this role do X in this tenant" and owns every change to
/// role grants.
///
/// The catalog is immutable once deployed, so name → id lookups are cached
/// for the life of the process. A miss reloads the catalog once before a name
/// is declared unknown.
pub struct PermissionResolver<S> {
    store: S,
    catalog: RwLock<HashMap<String, PermissionId>>,
}

impl<S: RbacStore> PermissionResolver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            catalog: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// `false` is the normal "no such grant" answer, not an error.
    #[instrument(skip_all, fields(role_id = %role_id, tenant_id = %tenant_id, permission = %permission))]
    pub async fn has_permission(
        &self,
        role_id: RoleId,
        tenant_id: TenantId,
        permission: &str,
    ) -> StoreResult<bool> {
        let granted = self.store.has_grant(tenant_id, role_id, permission).await?;
        tracing::debug!(granted, "permission check");
        Ok(granted)
    }

    /// Ok when the session's role holds `permission` in the session's tenant.
    /// Guests hold nothing.
    pub async fn require(&self, session: &Session, permission: &PermissionName) -> Result<(), AuthError> {
        let granted = match session.role_id {
            Some(role_id) => {
                self.has_permission(role_id, session.tenant_id(), permission.as_str())
                    .await?
            }
            None => false,
        };
        if granted {
            return Ok(());
        }
        tracing::info!(
            user_id = %session.user_id,
            tenant_id = %session.tenant_id(),
            permission = %permission,
            "authorization denied"
        );
        Err(AuthError::AuthorizationDenied(permission.to_string()))
    }

    /// Grant `names` to a role of the caller's tenant. Nothing is written if
    /// any name is unknown; already-held grants are left alone.
    #[instrument(skip_all, fields(role_id = %role_id, tenant_id = %scope.tenant_id()))]
    pub async fn assign_permissions<N: AsRef<str> + Sync>(
        &self,
        scope: &TenantScope,
        role_id: RoleId,
        names: &[N],
    ) -> Result<RoleWithPermissions, RbacError> {
        let ids = self.resolve_ids(names).await?;
        let added = self
            .store
            .insert_grants(scope.tenant_id(), role_id, &ids)
            .await?;
        tracing::info!(added, "permissions assigned");
        let role = self.store.role(scope.tenant_id(), role_id).await?;
        self.with_permissions(&role).await
    }

    /// Replace the role's whole grant set with `names` in one unit.
    pub async fn replace_permissions<N: AsRef<str> + Sync>(
        &self,
        scope: &TenantScope,
        role_id: RoleId,
        names: &[N],
    ) -> Result<RoleWithPermissions, RbacError> {
        self.write_role(scope, role_id, None, names).await
    }

    /// Create a role in the caller's tenant. The role is not created when any
    /// permission name is unknown.
    #[instrument(skip_all, fields(tenant_id = %scope.tenant_id()))]
    pub async fn create_role<N: AsRef<str> + Sync>(
        &self,
        scope: &TenantScope,
        name: &str,
        names: &[N],
    ) -> Result<RoleWithPermissions, RbacError> {
        let name = validate_role_name(name)?;
        let ids = self.resolve_ids(names).await?;
        let role = self.store.create_role(scope.tenant_id(), &name, &ids).await?;
        tracing::info!(role_id = %role.id, "role created");
        self.with_permissions(&role).await
    }

    /// Rename (when `name` is set) and replace grants in one unit.
    pub async fn update_role<N: AsRef<str> + Sync>(
        &self,
        scope: &TenantScope,
        role_id: RoleId,
        name: Option<&str>,
        names: &[N],
    ) -> Result<RoleWithPermissions, RbacError> {
        let name = name.map(validate_role_name).transpose()?;
        self.write_role(scope, role_id, name.as_deref(), names).await
    }

    #[instrument(skip_all, fields(tenant_id = %scope.tenant_id(), role_id = %role_id))]
    async fn write_role<N: AsRef<str> + Sync>(
        &self,
        scope: &TenantScope,
        role_id: RoleId,
        name: Option<&str>,
        names: &[N],
    ) -> Result<RoleWithPermissions, RbacError> {
        let ids = self.resolve_ids(names).await?;
        let role = self
            .store
            .replace_role(scope.tenant_id(), role_id, name, &ids)
            .await?;
        tracing::info!(grants = ids.len(), "role grants replaced");
        self.with_permissions(&role).await
    }

    pub async fn role(&self, scope: &TenantScope, role_id: RoleId) -> Result<Role, RbacError> {
        Ok(self.store.role(scope.tenant_id(), role_id).await?)
    }

    pub async fn roles(&self, scope: &TenantScope) -> Result<Vec<Role>, RbacError> {
        Ok(self.store.roles(scope.tenant_id()).await?)
    }

    pub async fn role_with_permissions(
        &self,
        scope: &TenantScope,
        role_id: RoleId,
    ) -> Result<RoleWithPermissions, RbacError> {
        let role = self.store.role(scope.tenant_id(), role_id).await?;
        self.with_permissions(&role).await
    }

    pub async fn roles_with_permissions(
        &self,
        scope: &TenantScope,
    ) -> Result<Vec<RoleWithPermissions>, RbacError> {
        let roles = self.store.roles(scope.tenant_id()).await?;
        let mut out = Vec::with_capacity(roles.len());
        for role in &roles {
            out.push(self.with_permissions(role).await?);
        }
        Ok(out)
    }

    pub async fn list_permissions(&self) -> Result<Vec<Permission>, RbacError> {
        Ok(self.store.permission_catalog().await?)
    }

    pub async fn permission_by_id(&self, id: PermissionId) -> Result<Permission, RbacError> {
        Ok(self.store.permission(id).await?)
    }

    pub async fn permission_by_name(&self, name: &str) -> Result<Permission, RbacError> {
        let ids = self.resolve_ids(&[name]).await.map_err(|e| match e {
            RbacError::PermissionNotFound { .. } => RbacError::NotFound,
            other => other,
        })?;
        match ids.first() {
            Some(id) => self.permission_by_id(*id).await,
            None => Err(RbacError::NotFound),
        }
    }

    async fn with_permissions(&self, role: &Role) -> Result<RoleWithPermissions, RbacError> {
        let granted = self
            .store
            .granted_permissions(role.tenant_id, role.id)
            .await?;
        Ok(RoleWithPermissions::new(
            role,
            granted.into_iter().map(|p| p.name).collect(),
        ))
    }

    /// Map names to catalog ids, reporting every unknown name at once.
    async fn resolve_ids<N: AsRef<str>>(&self, names: &[N]) -> Result<Vec<PermissionId>, RbacError> {
        let names = normalize_names(names);
        if names.is_empty() {
            return Ok(Vec::new());
        }

        if let Ok(ids) = self.lookup_cached(&names)? {
            return Ok(ids);
        }

        self.reload_catalog().await?;
        self.lookup_cached(&names)?
            .map_err(|missing| RbacError::PermissionNotFound { missing })
    }

    /// Outer error is a poisoned cache; inner error lists the names not found.
    fn lookup_cached(
        &self,
        names: &[String],
    ) -> Result<Result<Vec<PermissionId>, Vec<String>>, RbacError> {
        let cache = self
            .catalog
            .read()
            .map_err(|_| RbacError::Store(StoreError::backend("permission cache poisoned")))?;

        let mut ids = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match cache.get(name) {
                Some(id) => ids.push(*id),
                None => missing.push(name.clone()),
            }
        }
        Ok(if missing.is_empty() { Ok(ids) } else { Err(missing) })
    }

    async fn reload_catalog(&self) -> Result<(), RbacError> {
        let catalog = self.store.permission_catalog().await?;
        let mut cache = self
            .catalog
            .write()
            .map_err(|_| RbacError::Store(StoreError::backend("permission cache poisoned")))?;
        cache.clear();
        cache.extend(catalog.into_iter().map(|p| (p.name, p.id)));
        tracing::debug!(entries = cache.len(), "permission catalog cached");
        Ok(())
    }
}
