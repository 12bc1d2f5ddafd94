//! Storage seams implemented by the backends in `workstream-infra`.
//!
//! Raw `TenantId`s appear here because these traits sit *behind* the token
//! service: callers reach them through [`crate::PermissionResolver`],
//! [`crate::Provisioner`] or [`crate::Authenticator`], never from a request.

use std::sync::Arc;

use async_trait::async_trait;

use workstream_core::{PermissionId, RoleId, StoreResult, TenantId};

use crate::permissions::Permission;
use crate::roles::Role;
use crate::tenant::{Tenant, TenantDraft};
use crate::user::{NewUser, User};

/// Permission catalog, tenant roles and role grants.
#[async_trait]
pub trait RbacStore: Send + Sync {
    /// Full global catalog, ordered by id.
    async fn permission_catalog(&self) -> StoreResult<Vec<Permission>>;

    async fn permission(&self, id: PermissionId) -> StoreResult<Permission>;

    /// `NotFound` when the role does not exist in `tenant_id`.
    async fn role(&self, tenant_id: TenantId, role_id: RoleId) -> StoreResult<Role>;

    async fn roles(&self, tenant_id: TenantId) -> StoreResult<Vec<Role>>;

    /// Permissions granted to the role through grants recorded under `tenant_id`.
    async fn granted_permissions(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> StoreResult<Vec<Permission>>;

    /// True only when a grant `(role_id, <id of permission>, tenant_id)`
    /// exists and the role itself belongs to `tenant_id`.
    async fn has_grant(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        permission: &str,
    ) -> StoreResult<bool>;

    /// Insert the missing grants for a role of `tenant_id`. The role is
    /// looked up under that tenant first; a role of any other tenant is
    /// `NotFound`. Already-present grants are skipped. All or nothing.
    /// Returns the number of new grants.
    async fn insert_grants(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> StoreResult<usize>;

    /// Create a role with its grants in one unit.
    async fn create_role(
        &self,
        tenant_id: TenantId,
        name: &str,
        permission_ids: &[PermissionId],
    ) -> StoreResult<Role>;

    /// Optionally rename the role and replace its whole grant set in one unit.
    async fn replace_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        name: Option<&str>,
        permission_ids: &[PermissionId],
    ) -> StoreResult<Role>;
}

/// Lookup used by login. Usernames are unique across tenants.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn user_by_username(&self, username: &str) -> StoreResult<User>;
}

/// Transaction guarantee a provisioning backend offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Atomicity {
    /// All steps share one transaction; failure rolls it back.
    Native,
    /// Each step is durable on its own; failure is undone by deleting the
    /// tenant cascade.
    Compensating,
}

/// Backend for [`crate::Provisioner`].
#[async_trait]
pub trait ProvisioningStore: Send + Sync {
    fn atomicity(&self) -> Atomicity;

    async fn begin<'a>(&'a self) -> StoreResult<Box<dyn ProvisioningSteps + 'a>>;

    /// Delete a tenant and every row owned by it. Used for compensation.
    async fn delete_tenant_cascade(&self, tenant_id: TenantId) -> StoreResult<()>;
}

/// One provisioning run. Consumed by `commit` or `rollback`.
#[async_trait]
pub trait ProvisioningSteps: Send {
    async fn insert_tenant(&mut self, draft: &TenantDraft) -> StoreResult<Tenant>;

    async fn insert_roles(&mut self, tenant_id: TenantId, names: &[&str]) -> StoreResult<Vec<Role>>;

    async fn permission_catalog(&mut self) -> StoreResult<Vec<Permission>>;

    async fn insert_grants(&mut self, role: &Role, permission_ids: &[PermissionId]) -> StoreResult<()>;

    async fn insert_user(&mut self, tenant_id: TenantId, user: &NewUser) -> StoreResult<User>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

#[async_trait]
impl<S> RbacStore for Arc<S>
where
    S: RbacStore + ?Sized,
{
    async fn permission_catalog(&self) -> StoreResult<Vec<Permission>> {
        (**self).permission_catalog().await
    }

    async fn permission(&self, id: PermissionId) -> StoreResult<Permission> {
        (**self).permission(id).await
    }

    async fn role(&self, tenant_id: TenantId, role_id: RoleId) -> StoreResult<Role> {
        (**self).role(tenant_id, role_id).await
    }

    async fn roles(&self, tenant_id: TenantId) -> StoreResult<Vec<Role>> {
        (**self).roles(tenant_id).await
    }

    async fn granted_permissions(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> StoreResult<Vec<Permission>> {
        (**self).granted_permissions(tenant_id, role_id).await
    }

    async fn has_grant(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        permission: &str,
    ) -> StoreResult<bool> {
        (**self).has_grant(tenant_id, role_id, permission).await
    }

    async fn insert_grants(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> StoreResult<usize> {
        (**self).insert_grants(tenant_id, role_id, permission_ids).await
    }

    async fn create_role(
        &self,
        tenant_id: TenantId,
        name: &str,
        permission_ids: &[PermissionId],
    ) -> StoreResult<Role> {
        (**self).create_role(tenant_id, name, permission_ids).await
    }

    async fn replace_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        name: Option<&str>,
        permission_ids: &[PermissionId],
    ) -> StoreResult<Role> {
        (**self).replace_role(tenant_id, role_id, name, permission_ids).await
    }
}

#[async_trait]
impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    async fn user_by_username(&self, username: &str) -> StoreResult<User> {
        (**self).user_by_username(username).await
    }
}

#[async_trait]
impl<S> ProvisioningStore for Arc<S>
where
    S: ProvisioningStore + ?Sized,
{
    fn atomicity(&self) -> Atomicity {
        (**self).atomicity()
    }

    async fn begin<'a>(&'a self) -> StoreResult<Box<dyn ProvisioningSteps + 'a>> {
        (**self).begin().await
    }

    async fn delete_tenant_cascade(&self, tenant_id: TenantId) -> StoreResult<()> {
        (**self).delete_tenant_cascade(tenant_id).await
    }
}
