//! Tenant-scoped repositories over Postgres.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use workstream_auth::{NewUser, ProvisioningStore, Tenant, TenantPatch, TenantScope, User, UserChanges};
use workstream_core::{
    CustomerId, InventoryItemId, OrderId, StockId, StoreError, StoreResult, TenantId, UserId,
};
use workstream_inventory::{
    InventoryItem, InventoryItemDraft, InventoryItemPatch, StockDraft, StockPatch, StockView,
};
use workstream_parties::{Customer, CustomerDraft, CustomerPatch};
use workstream_sales::{Order, OrderItem, OrderItemDraft, OrderStatus};

use super::rows::{
    decode, decode_all, CustomerRow, ItemRow, OrderItemRow, OrderRow, StockRow, TenantRow, UserRow,
};
use super::{map_sqlx_error, PostgresStore};
use crate::repository::{
    CustomerRepository, InventoryRepository, OrderRepository, StockRepository, TenantDirectory,
    UserRepository,
};

const USER_COLUMNS: &str = "id, username, credential_hash, tenant_id, role_id";
const CUSTOMER_COLUMNS: &str = "id, name, email, tenant_id, is_deleted";
const ITEM_COLUMNS: &str = "id, name, description, price_cents, tenant_id, is_deleted";
const ORDER_COLUMNS: &str = "id, customer_id, tenant_id, order_date, status";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, inventory_item_id, quantity, price_cents";

/// Stock joined with a live item of tenant `$1`.
const STOCK_SELECT: &str = r#"
    SELECT s.id, s.inventory_item_id, s.quantity, s.manufacturing_date,
           s.expiration_date, s.batch_number, i.name AS inventory_item_name
    FROM stock s
    JOIN inventory_items i ON i.id = s.inventory_item_id
    WHERE i.tenant_id = $1 AND NOT i.is_deleted
"#;

fn found<T>(row: Option<T>) -> StoreResult<T> {
    row.ok_or(StoreError::NotFound)
}

fn affected(rows: u64) -> StoreResult<()> {
    if rows == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl TenantDirectory for PostgresStore {
    async fn tenant(&self, scope: &TenantScope) -> StoreResult<Tenant> {
        self.find_tenant(scope.tenant_id()).await
    }

    #[instrument(skip_all, fields(tenant_id = %scope.tenant_id()), err)]
    async fn update_tenant(&self, scope: &TenantScope, patch: &TenantPatch) -> StoreResult<Tenant> {
        let row = sqlx::query(
            r#"
            UPDATE tenants
            SET company_name = COALESCE($2, company_name),
                contact_email = COALESCE($3, contact_email)
            WHERE id = $1
            RETURNING id, company_name, contact_email
            "#,
        )
        .bind(scope.tenant_id().get())
        .bind(patch.company_name.as_deref())
        .bind(patch.contact_email.as_deref())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_tenant", e))?;
        decode::<TenantRow, Tenant>(&found(row)?)
    }

    async fn delete_tenant(&self, scope: &TenantScope) -> StoreResult<()> {
        self.delete_tenant_cascade(scope.tenant_id()).await
    }

    async fn find_tenant(&self, tenant_id: TenantId) -> StoreResult<Tenant> {
        let row = sqlx::query("SELECT id, company_name, contact_email FROM tenants WHERE id = $1")
            .bind(tenant_id.get())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_sqlx_error("find_tenant", e))?;
        decode::<TenantRow, Tenant>(&found(row)?)
    }
}

#[async_trait]
impl UserRepository for PostgresStore {
    #[instrument(skip_all, fields(tenant_id = %scope.tenant_id()), err)]
    async fn create_user(&self, scope: &TenantScope, user: &NewUser) -> StoreResult<User> {
        // The (role_id, tenant_id) foreign key rejects a role of another tenant.
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (username, credential_hash, tenant_id, role_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.credential_hash)
        .bind(scope.tenant_id().get())
        .bind(user.role_id.map(|id| id.get()))
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;
        decode::<UserRow, User>(&row)
    }

    async fn user(&self, scope: &TenantScope, id: UserId) -> StoreResult<User> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id.get())
        .bind(scope.tenant_id().get())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("user", e))?;
        decode::<UserRow, User>(&found(row)?)
    }

    async fn users(&self, scope: &TenantScope) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE tenant_id = $1 ORDER BY id"
        ))
        .bind(scope.tenant_id().get())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("users", e))?;
        decode_all::<UserRow, User>(&rows)
    }

    #[instrument(skip_all, fields(tenant_id = %scope.tenant_id(), user_id = %id), err)]
    async fn update_user(
        &self,
        scope: &TenantScope,
        id: UserId,
        changes: &UserChanges,
    ) -> StoreResult<User> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($3, username),
                credential_hash = COALESCE($4, credential_hash),
                role_id = COALESCE($5, role_id)
            WHERE id = $1 AND tenant_id = $2
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id.get())
        .bind(scope.tenant_id().get())
        .bind(changes.username.as_deref())
        .bind(changes.credential_hash.as_deref())
        .bind(changes.role_id.map(|r| r.get()))
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;
        decode::<UserRow, User>(&found(row)?)
    }
}

#[async_trait]
impl CustomerRepository for PostgresStore {
    async fn create_customer(&self, scope: &TenantScope, draft: &CustomerDraft) -> StoreResult<Customer> {
        let row = sqlx::query(&format!(
            "INSERT INTO customers (name, email, tenant_id) VALUES ($1, $2, $3) RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(scope.tenant_id().get())
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_sqlx_error("create_customer", e))?;
        decode::<CustomerRow, Customer>(&row)
    }

    async fn customer(&self, scope: &TenantScope, id: CustomerId) -> StoreResult<Customer> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1 AND tenant_id = $2 AND NOT is_deleted"
        ))
        .bind(id.get())
        .bind(scope.tenant_id().get())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("customer", e))?;
        decode::<CustomerRow, Customer>(&found(row)?)
    }

    async fn customers(&self, scope: &TenantScope) -> StoreResult<Vec<Customer>> {
        let rows = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE tenant_id = $1 AND NOT is_deleted ORDER BY id"
        ))
        .bind(scope.tenant_id().get())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("customers", e))?;
        decode_all::<CustomerRow, Customer>(&rows)
    }

    async fn update_customer(
        &self,
        scope: &TenantScope,
        id: CustomerId,
        patch: &CustomerPatch,
    ) -> StoreResult<Customer> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE customers
            SET name = COALESCE($3, name), email = COALESCE($4, email)
            WHERE id = $1 AND tenant_id = $2 AND NOT is_deleted
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(id.get())
        .bind(scope.tenant_id().get())
        .bind(patch.name.as_deref())
        .bind(patch.email.as_deref())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_customer", e))?;
        decode::<CustomerRow, Customer>(&found(row)?)
    }

    async fn delete_customer(&self, scope: &TenantScope, id: CustomerId) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE customers SET is_deleted = TRUE WHERE id = $1 AND tenant_id = $2 AND NOT is_deleted",
        )
        .bind(id.get())
        .bind(scope.tenant_id().get())
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("delete_customer", e))?;
        affected(result.rows_affected())
    }
}

#[async_trait]
impl InventoryRepository for PostgresStore {
    async fn create_item(
        &self,
        scope: &TenantScope,
        draft: &InventoryItemDraft,
    ) -> StoreResult<InventoryItem> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO inventory_items (name, description, price_cents, tenant_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(&draft.name)
        .bind(draft.description.as_deref())
        .bind(draft.price_cents)
        .bind(scope.tenant_id().get())
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_sqlx_error("create_item", e))?;
        decode::<ItemRow, InventoryItem>(&row)
    }

    async fn item(&self, scope: &TenantScope, id: InventoryItemId) -> StoreResult<InventoryItem> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1 AND tenant_id = $2 AND NOT is_deleted"
        ))
        .bind(id.get())
        .bind(scope.tenant_id().get())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("item", e))?;
        decode::<ItemRow, InventoryItem>(&found(row)?)
    }

    async fn items(&self, scope: &TenantScope) -> StoreResult<Vec<InventoryItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE tenant_id = $1 AND NOT is_deleted ORDER BY id"
        ))
        .bind(scope.tenant_id().get())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("items", e))?;
        decode_all::<ItemRow, InventoryItem>(&rows)
    }

    async fn search_items(&self, scope: &TenantScope, needle: &str) -> StoreResult<Vec<InventoryItem>> {
        // strpos keeps `%` and `_` in the needle literal.
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ITEM_COLUMNS} FROM inventory_items
            WHERE tenant_id = $1 AND NOT is_deleted AND strpos(lower(name), lower($2)) > 0
            ORDER BY id
            "#
        ))
        .bind(scope.tenant_id().get())
        .bind(needle)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("search_items", e))?;
        decode_all::<ItemRow, InventoryItem>(&rows)
    }

    async fn update_item(
        &self,
        scope: &TenantScope,
        id: InventoryItemId,
        patch: &InventoryItemPatch,
    ) -> StoreResult<InventoryItem> {
        // A blank description clears it.
        let row = sqlx::query(&format!(
            r#"
            UPDATE inventory_items
            SET name = COALESCE($3, name),
                description = CASE WHEN $4::text IS NULL THEN description
                                   ELSE NULLIF(btrim($4::text), '') END,
                price_cents = COALESCE($5, price_cents)
            WHERE id = $1 AND tenant_id = $2 AND NOT is_deleted
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(id.get())
        .bind(scope.tenant_id().get())
        .bind(patch.name.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.price_cents)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;
        decode::<ItemRow, InventoryItem>(&found(row)?)
    }

    async fn delete_item(&self, scope: &TenantScope, id: InventoryItemId) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE inventory_items SET is_deleted = TRUE WHERE id = $1 AND tenant_id = $2 AND NOT is_deleted",
        )
        .bind(id.get())
        .bind(scope.tenant_id().get())
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("delete_item", e))?;
        affected(result.rows_affected())
    }
}

#[async_trait]
impl StockRepository for PostgresStore {
    #[instrument(skip_all, fields(tenant_id = %scope.tenant_id(), item_id = %draft.inventory_item_id), err)]
    async fn create_stock(&self, scope: &TenantScope, draft: &StockDraft) -> StoreResult<StockView> {
        let row = sqlx::query(
            r#"
            WITH item AS (
                SELECT id, name FROM inventory_items
                WHERE id = $2 AND tenant_id = $1 AND NOT is_deleted
            ), inserted AS (
                INSERT INTO stock (inventory_item_id, quantity, manufacturing_date, expiration_date, batch_number)
                SELECT id, $3, $4, $5, $6 FROM item
                RETURNING *
            )
            SELECT s.id, s.inventory_item_id, s.quantity, s.manufacturing_date,
                   s.expiration_date, s.batch_number, item.name AS inventory_item_name
            FROM inserted s JOIN item ON item.id = s.inventory_item_id
            "#,
        )
        .bind(scope.tenant_id().get())
        .bind(draft.inventory_item_id.get())
        .bind(draft.quantity)
        .bind(draft.manufacturing_date)
        .bind(draft.expiration_date)
        .bind(&draft.batch_number)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("create_stock", e))?;
        decode::<StockRow, StockView>(&found(row)?)
    }

    async fn stock(&self, scope: &TenantScope, id: StockId) -> StoreResult<StockView> {
        let row = sqlx::query(&format!("{STOCK_SELECT} AND s.id = $2"))
            .bind(scope.tenant_id().get())
            .bind(id.get())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_sqlx_error("stock", e))?;
        decode::<StockRow, StockView>(&found(row)?)
    }

    async fn stock_for_item(
        &self,
        scope: &TenantScope,
        item_id: InventoryItemId,
    ) -> StoreResult<Vec<StockView>> {
        self.item(scope, item_id).await?;
        let rows = sqlx::query(&format!("{STOCK_SELECT} AND s.inventory_item_id = $2 ORDER BY s.id"))
            .bind(scope.tenant_id().get())
            .bind(item_id.get())
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("stock_for_item", e))?;
        decode_all::<StockRow, StockView>(&rows)
    }

    async fn all_stock(&self, scope: &TenantScope) -> StoreResult<Vec<StockView>> {
        let rows = sqlx::query(&format!("{STOCK_SELECT} ORDER BY s.id"))
            .bind(scope.tenant_id().get())
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("all_stock", e))?;
        decode_all::<StockRow, StockView>(&rows)
    }

    async fn update_stock(
        &self,
        scope: &TenantScope,
        id: StockId,
        patch: &StockPatch,
    ) -> StoreResult<StockView> {
        let row = sqlx::query(
            r#"
            UPDATE stock s
            SET quantity = COALESCE($3, s.quantity),
                manufacturing_date = COALESCE($4, s.manufacturing_date),
                expiration_date = COALESCE($5, s.expiration_date),
                batch_number = COALESCE($6, s.batch_number)
            FROM inventory_items i
            WHERE s.id = $2 AND i.id = s.inventory_item_id
              AND i.tenant_id = $1 AND NOT i.is_deleted
            RETURNING s.id, s.inventory_item_id, s.quantity, s.manufacturing_date,
                      s.expiration_date, s.batch_number, i.name AS inventory_item_name
            "#,
        )
        .bind(scope.tenant_id().get())
        .bind(id.get())
        .bind(patch.quantity)
        .bind(patch.manufacturing_date)
        .bind(patch.expiration_date)
        .bind(patch.batch_number.as_deref())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_stock", e))?;
        decode::<StockRow, StockView>(&found(row)?)
    }

    async fn delete_stock(&self, scope: &TenantScope, id: StockId) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM stock s
            USING inventory_items i
            WHERE s.id = $2 AND i.id = s.inventory_item_id
              AND i.tenant_id = $1 AND NOT i.is_deleted
            "#,
        )
        .bind(scope.tenant_id().get())
        .bind(id.get())
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("delete_stock", e))?;
        affected(result.rows_affected())
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    #[instrument(skip_all, fields(tenant_id = %scope.tenant_id(), customer_id = %customer_id), err)]
    async fn create_order(
        &self,
        scope: &TenantScope,
        customer_id: CustomerId,
        order_date: DateTime<Utc>,
        status: OrderStatus,
    ) -> StoreResult<Order> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (customer_id, tenant_id, order_date, status)
            SELECT c.id, c.tenant_id, $3, $4
            FROM customers c
            WHERE c.id = $1 AND c.tenant_id = $2 AND NOT c.is_deleted
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(customer_id.get())
        .bind(scope.tenant_id().get())
        .bind(order_date)
        .bind(status.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("create_order", e))?;
        decode::<OrderRow, Order>(&found(row)?)
    }

    async fn order(&self, scope: &TenantScope, id: OrderId) -> StoreResult<Order> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id.get())
        .bind(scope.tenant_id().get())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("order", e))?;
        decode::<OrderRow, Order>(&found(row)?)
    }

    async fn orders(&self, scope: &TenantScope) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE tenant_id = $1 ORDER BY id"
        ))
        .bind(scope.tenant_id().get())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("orders", e))?;
        decode_all::<OrderRow, Order>(&rows)
    }

    async fn update_order_status(
        &self,
        scope: &TenantScope,
        id: OrderId,
        status: OrderStatus,
    ) -> StoreResult<Order> {
        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $3 WHERE id = $1 AND tenant_id = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.get())
        .bind(scope.tenant_id().get())
        .bind(status.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_order_status", e))?;
        decode::<OrderRow, Order>(&found(row)?)
    }

    #[instrument(skip_all, fields(tenant_id = %scope.tenant_id(), order_id = %order_id), err)]
    async fn add_order_item(
        &self,
        scope: &TenantScope,
        order_id: OrderId,
        draft: &OrderItemDraft,
    ) -> StoreResult<OrderItem> {
        // Order and item must both be in the caller's tenant; the price is
        // copied from the item at insert time.
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO order_items (order_id, inventory_item_id, quantity, price_cents)
            SELECT o.id, i.id, $4, i.price_cents
            FROM orders o
            JOIN inventory_items i ON i.tenant_id = o.tenant_id
            WHERE o.id = $1 AND o.tenant_id = $2 AND i.id = $3 AND NOT i.is_deleted
            RETURNING {ORDER_ITEM_COLUMNS}
            "#
        ))
        .bind(order_id.get())
        .bind(scope.tenant_id().get())
        .bind(draft.inventory_item_id.get())
        .bind(draft.quantity)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("add_order_item", e))?;
        decode::<OrderItemRow, OrderItem>(&found(row)?)
    }

    async fn order_items(&self, scope: &TenantScope, order_id: OrderId) -> StoreResult<Vec<OrderItem>> {
        self.order(scope, order_id).await?;
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_ITEM_COLUMNS} FROM order_items
            WHERE order_id = $1
              AND EXISTS (SELECT 1 FROM orders o WHERE o.id = order_items.order_id AND o.tenant_id = $2)
            ORDER BY id
            "#
        ))
        .bind(order_id.get())
        .bind(scope.tenant_id().get())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("order_items", e))?;
        decode_all::<OrderItemRow, OrderItem>(&rows)
    }
}
