//! PostgreSQL storage backend.
//!
//! ## Tenant isolation
//!
//! Every query on a tenant-owned table carries `tenant_id = $n` taken from the
//! caller's scope, next to the row id. Stock has no tenant column and is
//! joined through `inventory_items`. A filtered-out row reads as `NotFound`.
//!
//! ## Error mapping
//!
//! | SQLx error | Code | `StoreError` |
//! |------------|------|--------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `NotFound` |
//! | Database (check violation) | `23514` | `Backend` |
//! | RowNotFound | n/a | `NotFound` |
//! | anything else | n/a | `Backend` |
//!
//! Provisioning runs in one transaction, so this backend declares
//! [`Atomicity::Native`].

mod provisioning;
mod repositories;
mod rows;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use workstream_auth::{
    Atomicity, CredentialStore, Permission, ProvisioningSteps, ProvisioningStore, RbacStore, Role,
    User,
};
use workstream_core::{PermissionId, RoleId, StoreError, StoreResult, TenantId};

use provisioning::PgSteps;
use rows::{decode, decode_all, PermissionRow, RoleRow, UserRow};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

/// Postgres-backed implementation of every store and repository trait.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect a pool of at most `max_connections` to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create missing tables. Safe to run on every start.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    /// Add catalog entries that do not exist yet. Returns the full catalog.
    #[instrument(skip_all, fields(requested = names.len()), err)]
    pub async fn seed_permissions<N: AsRef<str>>(&self, names: &[N]) -> StoreResult<Vec<Permission>> {
        let names: Vec<String> = names
            .iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        sqlx::query(
            r#"
            INSERT INTO permissions (name)
            SELECT unnest($1::text[])
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(&names)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("seed_permissions", e))?;

        self.permission_catalog().await
    }

    async fn begin_tx(&self, operation: &str) -> StoreResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|e| map_sqlx_error(operation, e))
    }
}

/// Map SQLx errors to [`StoreError`].
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                // A reference to a row that does not exist (or not in this tenant).
                Some("23503") => StoreError::NotFound,
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

fn ids(permission_ids: &[PermissionId]) -> Vec<i64> {
    permission_ids.iter().map(|id| id.get()).collect()
}

/// Insert grants for `role` under its own tenant, skipping present ones.
async fn insert_grants_in(
    tx: &mut Transaction<'_, Postgres>,
    role: &Role,
    permission_ids: &[PermissionId],
) -> StoreResult<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO role_permissions (role_id, permission_id, tenant_id)
        SELECT $1, unnest($2::bigint[]), $3
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(role.id.get())
    .bind(ids(permission_ids))
    .bind(role.tenant_id.get())
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_grants", e))?;
    Ok(result.rows_affected())
}

async fn role_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: TenantId,
    role_id: RoleId,
) -> StoreResult<Role> {
    let row = sqlx::query(
        "SELECT id, name, tenant_id FROM roles WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
    )
    .bind(role_id.get())
    .bind(tenant_id.get())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("role", e))?
    .ok_or(StoreError::NotFound)?;
    decode::<RoleRow, Role>(&row)
}

#[async_trait]
impl RbacStore for PostgresStore {
    async fn permission_catalog(&self) -> StoreResult<Vec<Permission>> {
        let rows = sqlx::query("SELECT id, name FROM permissions ORDER BY id")
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("permission_catalog", e))?;
        decode_all::<PermissionRow, Permission>(&rows)
    }

    async fn permission(&self, id: PermissionId) -> StoreResult<Permission> {
        let row = sqlx::query("SELECT id, name FROM permissions WHERE id = $1")
            .bind(id.get())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_sqlx_error("permission", e))?
            .ok_or(StoreError::NotFound)?;
        decode::<PermissionRow, Permission>(&row)
    }

    async fn role(&self, tenant_id: TenantId, role_id: RoleId) -> StoreResult<Role> {
        let row = sqlx::query("SELECT id, name, tenant_id FROM roles WHERE id = $1 AND tenant_id = $2")
            .bind(role_id.get())
            .bind(tenant_id.get())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_sqlx_error("role", e))?
            .ok_or(StoreError::NotFound)?;
        decode::<RoleRow, Role>(&row)
    }

    async fn roles(&self, tenant_id: TenantId) -> StoreResult<Vec<Role>> {
        let rows = sqlx::query("SELECT id, name, tenant_id FROM roles WHERE tenant_id = $1 ORDER BY id")
            .bind(tenant_id.get())
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("roles", e))?;
        decode_all::<RoleRow, Role>(&rows)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, role_id = %role_id), err)]
    async fn granted_permissions(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> StoreResult<Vec<Permission>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name
            FROM role_permissions rp
            JOIN roles r ON r.id = rp.role_id AND r.tenant_id = rp.tenant_id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = $1 AND rp.tenant_id = $2
            ORDER BY p.id
            "#,
        )
        .bind(role_id.get())
        .bind(tenant_id.get())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("granted_permissions", e))?;
        decode_all::<PermissionRow, Permission>(&rows)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, role_id = %role_id), err)]
    async fn has_grant(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        permission: &str,
    ) -> StoreResult<bool> {
        let found: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM role_permissions rp
                JOIN roles r ON r.id = rp.role_id AND r.tenant_id = rp.tenant_id
                JOIN permissions p ON p.id = rp.permission_id
                WHERE rp.role_id = $1 AND rp.tenant_id = $2 AND p.name = $3
            )
            "#,
        )
        .bind(role_id.get())
        .bind(tenant_id.get())
        .bind(permission)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_sqlx_error("has_grant", e))?;
        Ok(found)
    }

    #[instrument(skip(self, permission_ids), fields(tenant_id = %tenant_id, role_id = %role_id), err)]
    async fn insert_grants(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> StoreResult<usize> {
        let mut tx = self.begin_tx("insert_grants").await?;
        let role = role_in_tx(&mut tx, tenant_id, role_id).await?;
        let added = insert_grants_in(&mut tx, &role, permission_ids).await?;
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(added as usize)
    }

    #[instrument(skip(self, permission_ids), fields(tenant_id = %tenant_id), err)]
    async fn create_role(
        &self,
        tenant_id: TenantId,
        name: &str,
        permission_ids: &[PermissionId],
    ) -> StoreResult<Role> {
        let mut tx = self.begin_tx("create_role").await?;
        let row = sqlx::query(
            "INSERT INTO roles (name, tenant_id) VALUES ($1, $2) RETURNING id, name, tenant_id",
        )
        .bind(name)
        .bind(tenant_id.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_role", e))?;
        let role = decode::<RoleRow, Role>(&row)?;
        // Dropping the transaction on error rolls the role back.
        insert_grants_in(&mut tx, &role, permission_ids).await?;
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(role)
    }

    #[instrument(skip(self, name, permission_ids), fields(tenant_id = %tenant_id, role_id = %role_id), err)]
    async fn replace_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        name: Option<&str>,
        permission_ids: &[PermissionId],
    ) -> StoreResult<Role> {
        let mut tx = self.begin_tx("replace_role").await?;
        let mut role = role_in_tx(&mut tx, tenant_id, role_id).await?;

        if let Some(name) = name {
            sqlx::query("UPDATE roles SET name = $1 WHERE id = $2 AND tenant_id = $3")
                .bind(name)
                .bind(role_id.get())
                .bind(tenant_id.get())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("rename_role", e))?;
            role.name = name.to_string();
        }

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND tenant_id = $2")
            .bind(role_id.get())
            .bind(tenant_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear_grants", e))?;
        insert_grants_in(&mut tx, &role, permission_ids).await?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(role)
    }
}

#[async_trait]
impl CredentialStore for PostgresStore {
    async fn user_by_username(&self, username: &str) -> StoreResult<User> {
        let row = sqlx::query(
            "SELECT id, username, credential_hash, tenant_id, role_id FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("user_by_username", e))?
        .ok_or(StoreError::NotFound)?;
        decode::<UserRow, User>(&row)
    }
}

#[async_trait]
impl ProvisioningStore for PostgresStore {
    fn atomicity(&self) -> Atomicity {
        Atomicity::Native
    }

    async fn begin<'a>(&'a self) -> StoreResult<Box<dyn ProvisioningSteps + 'a>> {
        let tx = self.begin_tx("begin_provisioning").await?;
        Ok(Box::new(PgSteps::new(tx)))
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn delete_tenant_cascade(&self, tenant_id: TenantId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(tenant_id.get())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_tenant", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        tracing::info!(%tenant_id, "tenant deleted with all owned rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workstream_auth::DEFAULT_CATALOG;

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert_eq!(map_sqlx_error("q", sqlx::Error::RowNotFound), StoreError::NotFound);
        assert!(matches!(
            map_sqlx_error("q", sqlx::Error::PoolClosed),
            StoreError::Backend(msg) if msg.contains("q")
        ));
    }

    /// Runs only when `DATABASE_URL` points at a scratch database.
    #[tokio::test]
    async fn runs_the_tenant_scope_conformance_suite() {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            return;
        };
        let store = PostgresStore::connect(&url, 5).await.unwrap();
        store.migrate().await.unwrap();
        store.seed_permissions(&DEFAULT_CATALOG).await.unwrap();
        crate::conformance::run_all(Arc::new(store)).await;
    }
}
