use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use workstream_auth::{NewUser, Permission, ProvisioningSteps, Role, Tenant, TenantDraft, User};
use workstream_core::{PermissionId, StoreResult, TenantId};

use super::rows::{decode, decode_all, PermissionRow, RoleRow, TenantRow, UserRow};
use super::{insert_grants_in, map_sqlx_error};

/// One provisioning run inside a single transaction. Nothing is visible to
/// other connections until `commit`; dropping the run rolls it back.
pub(super) struct PgSteps {
    tx: Transaction<'static, Postgres>,
}

impl PgSteps {
    pub(super) fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ProvisioningSteps for PgSteps {
    async fn insert_tenant(&mut self, draft: &TenantDraft) -> StoreResult<Tenant> {
        let row = sqlx::query(
            r#"
            INSERT INTO tenants (company_name, contact_email)
            VALUES ($1, $2)
            RETURNING id, company_name, contact_email
            "#,
        )
        .bind(&draft.company_name)
        .bind(&draft.contact_email)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_tenant", e))?;
        decode::<TenantRow, Tenant>(&row)
    }

    async fn insert_roles(&mut self, tenant_id: TenantId, names: &[&str]) -> StoreResult<Vec<Role>> {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let rows = sqlx::query(
            r#"
            INSERT INTO roles (name, tenant_id)
            SELECT name, $2 FROM unnest($1::text[]) WITH ORDINALITY AS t(name, ord)
            ORDER BY ord
            RETURNING id, name, tenant_id
            "#,
        )
        .bind(&names)
        .bind(tenant_id.get())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_roles", e))?;
        decode_all::<RoleRow, Role>(&rows)
    }

    async fn permission_catalog(&mut self) -> StoreResult<Vec<Permission>> {
        let rows = sqlx::query("SELECT id, name FROM permissions ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("permission_catalog", e))?;
        decode_all::<PermissionRow, Permission>(&rows)
    }

    async fn insert_grants(&mut self, role: &Role, permission_ids: &[PermissionId]) -> StoreResult<()> {
        insert_grants_in(&mut self.tx, role, permission_ids).await?;
        Ok(())
    }

    async fn insert_user(&mut self, tenant_id: TenantId, user: &NewUser) -> StoreResult<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, credential_hash, tenant_id, role_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, credential_hash, tenant_id, role_id
            "#,
        )
        .bind(&user.username)
        .bind(&user.credential_hash)
        .bind(tenant_id.get())
        .bind(user.role_id.map(|id| id.get()))
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        decode::<UserRow, User>(&row)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_provisioning", e))
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback_provisioning", e))
    }
}
