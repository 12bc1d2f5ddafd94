//! Tenant-scoped repository contracts.
//!
//! Every operation on a tenant-owned entity takes the caller's [`TenantScope`]
//! and filters by it in addition to the entity id. A row of another tenant
//! and a missing row both come back as [`StoreError::NotFound`]; so do
//! soft-deleted rows. Writes re-fetch the row under the scope before touching it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use workstream_auth::{
    CredentialStore, NewUser, ProvisioningStore, RbacStore, Tenant, TenantPatch, TenantScope, User,
    UserChanges,
};
use workstream_core::{
    CustomerId, InventoryItemId, OrderId, StockId, StoreResult, TenantId, UserId,
};
use workstream_inventory::{
    InventoryItem, InventoryItemDraft, InventoryItemPatch, StockDraft, StockPatch, StockView,
};
use workstream_parties::{Customer, CustomerDraft, CustomerPatch};
use workstream_sales::{Order, OrderItem, OrderItemDraft, OrderStatus};

#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// The caller's own tenant.
    async fn tenant(&self, scope: &TenantScope) -> StoreResult<Tenant>;

    async fn update_tenant(&self, scope: &TenantScope, patch: &TenantPatch) -> StoreResult<Tenant>;

    /// Delete the caller's tenant and every row it owns.
    async fn delete_tenant(&self, scope: &TenantScope) -> StoreResult<()>;

    /// Unscoped lookup for operators and provisioning checks. Never routed
    /// from a request.
    async fn find_tenant(&self, tenant_id: TenantId) -> StoreResult<Tenant>;
}

/// Users of the caller's tenant. A role id must name a role of the same
/// tenant, otherwise the call fails with `NotFound`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, scope: &TenantScope, user: &NewUser) -> StoreResult<User>;

    async fn user(&self, scope: &TenantScope, id: UserId) -> StoreResult<User>;

    async fn users(&self, scope: &TenantScope) -> StoreResult<Vec<User>>;

    async fn update_user(
        &self,
        scope: &TenantScope,
        id: UserId,
        changes: &UserChanges,
    ) -> StoreResult<User>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn create_customer(&self, scope: &TenantScope, draft: &CustomerDraft) -> StoreResult<Customer>;

    async fn customer(&self, scope: &TenantScope, id: CustomerId) -> StoreResult<Customer>;

    async fn customers(&self, scope: &TenantScope) -> StoreResult<Vec<Customer>>;

    async fn update_customer(
        &self,
        scope: &TenantScope,
        id: CustomerId,
        patch: &CustomerPatch,
    ) -> StoreResult<Customer>;

    async fn delete_customer(&self, scope: &TenantScope, id: CustomerId) -> StoreResult<()>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn create_item(
        &self,
        scope: &TenantScope,
        draft: &InventoryItemDraft,
    ) -> StoreResult<InventoryItem>;

    async fn item(&self, scope: &TenantScope, id: InventoryItemId) -> StoreResult<InventoryItem>;

    async fn items(&self, scope: &TenantScope) -> StoreResult<Vec<InventoryItem>>;

    /// Case-insensitive substring search on the item name.
    async fn search_items(&self, scope: &TenantScope, needle: &str) -> StoreResult<Vec<InventoryItem>>;

    async fn update_item(
        &self,
        scope: &TenantScope,
        id: InventoryItemId,
        patch: &InventoryItemPatch,
    ) -> StoreResult<InventoryItem>;

    async fn delete_item(&self, scope: &TenantScope, id: InventoryItemId) -> StoreResult<()>;
}

/// Stock is scoped through its inventory item. Stock of a soft-deleted item
/// is not visible.
#[async_trait]
pub trait StockRepository: Send + Sync {
    async fn create_stock(&self, scope: &TenantScope, draft: &StockDraft) -> StoreResult<StockView>;

    async fn stock(&self, scope: &TenantScope, id: StockId) -> StoreResult<StockView>;

    async fn stock_for_item(
        &self,
        scope: &TenantScope,
        item_id: InventoryItemId,
    ) -> StoreResult<Vec<StockView>>;

    async fn all_stock(&self, scope: &TenantScope) -> StoreResult<Vec<StockView>>;

    /// Apply an already validated patch (see [`StockPatch::validated_for`]).
    async fn update_stock(
        &self,
        scope: &TenantScope,
        id: StockId,
        patch: &StockPatch,
    ) -> StoreResult<StockView>;

    /// Hard delete.
    async fn delete_stock(&self, scope: &TenantScope, id: StockId) -> StoreResult<()>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// The customer must belong to the caller's tenant and not be deleted.
    async fn create_order(
        &self,
        scope: &TenantScope,
        customer_id: CustomerId,
        order_date: DateTime<Utc>,
        status: OrderStatus,
    ) -> StoreResult<Order>;

    async fn order(&self, scope: &TenantScope, id: OrderId) -> StoreResult<Order>;

    async fn orders(&self, scope: &TenantScope) -> StoreResult<Vec<Order>>;

    async fn update_order_status(
        &self,
        scope: &TenantScope,
        id: OrderId,
        status: OrderStatus,
    ) -> StoreResult<Order>;

    /// Add a line for an item of the caller's tenant; the unit price is copied
    /// from the item.
    async fn add_order_item(
        &self,
        scope: &TenantScope,
        order_id: OrderId,
        draft: &OrderItemDraft,
    ) -> StoreResult<OrderItem>;

    async fn order_items(&self, scope: &TenantScope, order_id: OrderId) -> StoreResult<Vec<OrderItem>>;
}

/// Everything a storage backend provides, as one object.
pub trait Store:
    RbacStore
    + CredentialStore
    + ProvisioningStore
    + TenantDirectory
    + UserRepository
    + CustomerRepository
    + InventoryRepository
    + StockRepository
    + OrderRepository
{
}

impl<T> Store for T where
    T: RbacStore
        + CredentialStore
        + ProvisioningStore
        + TenantDirectory
        + UserRepository
        + CustomerRepository
        + InventoryRepository
        + StockRepository
        + OrderRepository
{
}

pub type SharedStore = Arc<dyn Store>;
