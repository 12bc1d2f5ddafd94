//! In-memory storage backend for tests and development.
//!
//! Arena-style: one table per entity keyed by integer id, relationships held
//! as id fields. All tables sit behind a single `RwLock` so multi-table writes
//! (role + grants, tenant cascade) are atomic. Provisioning steps are durable
//! one by one, so this backend declares [`Atomicity::Compensating`].

mod table;

use std::collections::BTreeSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use workstream_auth::{
    Atomicity, CredentialStore, NewUser, Permission, ProvisioningSteps, ProvisioningStore,
    RbacStore, Role, RolePermission, Tenant, TenantDraft, TenantPatch, TenantScope, User,
    UserChanges,
};
use workstream_core::{
    CustomerId, InventoryItemId, OrderId, OrderItemId, PermissionId, RoleId, StockId, StoreError,
    StoreResult, TenantId, UserId,
};
use workstream_inventory::{
    InventoryItem, InventoryItemDraft, InventoryItemPatch, Stock, StockDraft, StockPatch, StockView,
};
use workstream_parties::{Customer, CustomerDraft, CustomerPatch};
use workstream_sales::{Order, OrderItem, OrderItemDraft, OrderStatus};

use crate::repository::{
    CustomerRepository, InventoryRepository, OrderRepository, StockRepository, TenantDirectory,
    UserRepository,
};

use table::Table;

#[derive(Debug, Default)]
struct State {
    tenants: Table<TenantId, Tenant>,
    roles: Table<RoleId, Role>,
    permissions: Table<PermissionId, Permission>,
    grants: BTreeSet<RolePermission>,
    users: Table<UserId, User>,
    customers: Table<CustomerId, Customer>,
    items: Table<InventoryItemId, InventoryItem>,
    stock: Table<StockId, Stock>,
    orders: Table<OrderId, Order>,
    order_items: Table<OrderItemId, OrderItem>,
}

/// In-memory backend implementing every store and repository trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::backend("memory store lock poisoned"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::backend("memory store lock poisoned"))
    }

    /// Add catalog entries that do not exist yet. Returns the full catalog.
    pub fn seed_permissions<N: AsRef<str>>(&self, names: &[N]) -> StoreResult<Vec<Permission>> {
        let mut state = self.write()?;
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || state.permissions.find(|p| p.name == name).is_some() {
                continue;
            }
            state.permissions.insert_with(|id| Permission {
                id,
                name: name.to_string(),
            });
        }
        tracing::debug!(entries = state.permissions.len(), "permission catalog seeded");
        Ok(state.permissions.values().cloned().collect())
    }

    /// Write a grant row as-is, bypassing the tenant checks of the normal
    /// write path.
    #[cfg(test)]
    pub(crate) fn insert_raw_grant(&self, grant: RolePermission) -> StoreResult<()> {
        self.write()?.grants.insert(grant);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn grant_rows(&self, role_id: RoleId) -> StoreResult<usize> {
        Ok(self.read()?.grants.iter().filter(|g| g.role_id == role_id).count())
    }

    #[cfg(test)]
    pub(crate) fn role_rows(&self, tenant_id: TenantId) -> StoreResult<usize> {
        Ok(self.read()?.roles.filtered(|r| r.tenant_id == tenant_id).len())
    }
}

impl State {
    fn tenant_exists(&self, tenant_id: TenantId) -> StoreResult<()> {
        self.tenants.get(tenant_id).map(|_| ()).ok_or(StoreError::NotFound)
    }

    fn role_in(&self, tenant_id: TenantId, role_id: RoleId) -> StoreResult<&Role> {
        self.roles
            .get(role_id)
            .filter(|r| r.tenant_id == tenant_id)
            .ok_or(StoreError::NotFound)
    }

    fn check_permission_ids(&self, ids: &[PermissionId]) -> StoreResult<()> {
        if ids.iter().all(|id| self.permissions.get(*id).is_some()) {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn check_role_name_free(&self, tenant_id: TenantId, name: &str, except: Option<RoleId>) -> StoreResult<()> {
        let taken = self
            .roles
            .find(|r| r.tenant_id == tenant_id && r.name == name && Some(r.id) != except)
            .is_some();
        if taken {
            return Err(StoreError::conflict(format!("role '{name}' already exists")));
        }
        Ok(())
    }

    fn check_username_free(&self, username: &str, except: Option<UserId>) -> StoreResult<()> {
        let taken = self
            .users
            .find(|u| u.username == username && Some(u.id) != except)
            .is_some();
        if taken {
            return Err(StoreError::conflict(format!("username '{username}' is taken")));
        }
        Ok(())
    }

    fn insert_grants(
        &mut self,
        tenant_id: TenantId,
        role_id: RoleId,
        ids: &[PermissionId],
    ) -> StoreResult<usize> {
        let role = self.role_in(tenant_id, role_id)?.clone();
        self.check_permission_ids(ids)?;
        let mut added = 0;
        for id in ids {
            let grant = RolePermission {
                role_id: role.id,
                permission_id: *id,
                tenant_id: role.tenant_id,
            };
            if self.grants.insert(grant) {
                added += 1;
            }
        }
        Ok(added)
    }

    fn insert_role(&mut self, tenant_id: TenantId, name: &str) -> StoreResult<Role> {
        self.tenant_exists(tenant_id)?;
        self.check_role_name_free(tenant_id, name, None)?;
        Ok(self.roles.insert_with(|id| Role {
            id,
            name: name.to_string(),
            tenant_id,
        }))
    }

    fn insert_user(&mut self, tenant_id: TenantId, user: &NewUser) -> StoreResult<User> {
        self.tenant_exists(tenant_id)?;
        if let Some(role_id) = user.role_id {
            self.role_in(tenant_id, role_id)?;
        }
        self.check_username_free(&user.username, None)?;
        Ok(self.users.insert_with(|id| User {
            id,
            username: user.username.clone(),
            credential_hash: user.credential_hash.clone(),
            tenant_id,
            role_id: user.role_id,
        }))
    }

    /// Remove a tenant and everything it owns, directly or through another row.
    fn delete_tenant_cascade(&mut self, tenant_id: TenantId) -> StoreResult<()> {
        self.tenants.remove(tenant_id).ok_or(StoreError::NotFound)?;

        let role_ids: BTreeSet<RoleId> = self
            .roles
            .filtered(|r| r.tenant_id == tenant_id)
            .into_iter()
            .map(|r| r.id)
            .collect();
        let item_ids: BTreeSet<InventoryItemId> = self
            .items
            .filtered(|i| i.tenant_id == tenant_id)
            .into_iter()
            .map(|i| i.id)
            .collect();
        let order_ids: BTreeSet<OrderId> = self
            .orders
            .filtered(|o| o.tenant_id == tenant_id)
            .into_iter()
            .map(|o| o.id)
            .collect();

        self.grants
            .retain(|g| g.tenant_id != tenant_id && !role_ids.contains(&g.role_id));
        self.roles.retain(|r| r.tenant_id != tenant_id);
        self.users.retain(|u| u.tenant_id != tenant_id);
        self.customers.retain(|c| c.tenant_id != tenant_id);
        self.stock.retain(|s| !item_ids.contains(&s.inventory_item_id));
        self.items.retain(|i| i.tenant_id != tenant_id);
        self.order_items.retain(|l| !order_ids.contains(&l.order_id));
        self.orders.retain(|o| o.tenant_id != tenant_id);

        tracing::info!(%tenant_id, "tenant deleted with all owned rows");
        Ok(())
    }

    fn visible_customer(&self, scope: &TenantScope, id: CustomerId) -> StoreResult<&Customer> {
        self.customers
            .get(id)
            .filter(|c| c.tenant_id == scope.tenant_id() && !c.is_deleted)
            .ok_or(StoreError::NotFound)
    }

    fn visible_item(&self, scope: &TenantScope, id: InventoryItemId) -> StoreResult<&InventoryItem> {
        self.items
            .get(id)
            .filter(|i| i.tenant_id == scope.tenant_id() && !i.is_deleted)
            .ok_or(StoreError::NotFound)
    }

    fn visible_stock(&self, scope: &TenantScope, id: StockId) -> StoreResult<StockView> {
        let stock = self.stock.get(id).ok_or(StoreError::NotFound)?;
        let item = self.visible_item(scope, stock.inventory_item_id)?;
        Ok(StockView {
            stock: stock.clone(),
            inventory_item_name: item.name.clone(),
        })
    }

    fn scoped_order(&self, scope: &TenantScope, id: OrderId) -> StoreResult<&Order> {
        self.orders
            .get(id)
            .filter(|o| o.tenant_id == scope.tenant_id())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl RbacStore for MemoryStore {
    async fn permission_catalog(&self) -> StoreResult<Vec<Permission>> {
        Ok(self.read()?.permissions.values().cloned().collect())
    }

    async fn permission(&self, id: PermissionId) -> StoreResult<Permission> {
        self.read()?
            .permissions
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn role(&self, tenant_id: TenantId, role_id: RoleId) -> StoreResult<Role> {
        self.read()?.role_in(tenant_id, role_id).cloned()
    }

    async fn roles(&self, tenant_id: TenantId) -> StoreResult<Vec<Role>> {
        Ok(self.read()?.roles.filtered(|r| r.tenant_id == tenant_id))
    }

    async fn granted_permissions(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> StoreResult<Vec<Permission>> {
        let state = self.read()?;
        if state.role_in(tenant_id, role_id).is_err() {
            return Ok(Vec::new());
        }
        Ok(state
            .grants
            .iter()
            .filter(|g| g.role_id == role_id && g.tenant_id == tenant_id)
            .filter_map(|g| state.permissions.get(g.permission_id).cloned())
            .collect())
    }

    async fn has_grant(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        permission: &str,
    ) -> StoreResult<bool> {
        let state = self.read()?;
        if state.role_in(tenant_id, role_id).is_err() {
            return Ok(false);
        }
        let Some(permission) = state.permissions.find(|p| p.name == permission) else {
            return Ok(false);
        };
        Ok(state.grants.contains(&RolePermission {
            role_id,
            permission_id: permission.id,
            tenant_id,
        }))
    }

    async fn insert_grants(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> StoreResult<usize> {
        self.write()?.insert_grants(tenant_id, role_id, permission_ids)
    }

    async fn create_role(
        &self,
        tenant_id: TenantId,
        name: &str,
        permission_ids: &[PermissionId],
    ) -> StoreResult<Role> {
        let mut state = self.write()?;
        // Validate before the first write so a failure leaves nothing behind.
        state.tenant_exists(tenant_id)?;
        state.check_permission_ids(permission_ids)?;
        let role = state.insert_role(tenant_id, name)?;
        state.insert_grants(role.tenant_id, role.id, permission_ids)?;
        Ok(role)
    }

    async fn replace_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        name: Option<&str>,
        permission_ids: &[PermissionId],
    ) -> StoreResult<Role> {
        let mut state = self.write()?;
        state.role_in(tenant_id, role_id)?;
        state.check_permission_ids(permission_ids)?;
        if let Some(name) = name {
            state.check_role_name_free(tenant_id, name, Some(role_id))?;
        }

        let role = {
            let role = state.roles.get_mut(role_id).ok_or(StoreError::NotFound)?;
            if let Some(name) = name {
                role.name = name.to_string();
            }
            role.clone()
        };
        state.grants.retain(|g| g.role_id != role_id);
        state.insert_grants(role.tenant_id, role.id, permission_ids)?;
        Ok(role)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn user_by_username(&self, username: &str) -> StoreResult<User> {
        self.read()?
            .users
            .find(|u| u.username == username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

/// Steps of one provisioning run; each one is applied immediately.
struct MemorySteps<'a> {
    store: &'a MemoryStore,
}

#[async_trait]
impl ProvisioningSteps for MemorySteps<'_> {
    async fn insert_tenant(&mut self, draft: &TenantDraft) -> StoreResult<Tenant> {
        let mut state = self.store.write()?;
        Ok(state.tenants.insert_with(|id| Tenant {
            id,
            company_name: draft.company_name.clone(),
            contact_email: draft.contact_email.clone(),
        }))
    }

    async fn insert_roles(&mut self, tenant_id: TenantId, names: &[&str]) -> StoreResult<Vec<Role>> {
        let mut state = self.store.write()?;
        names
            .iter()
            .map(|name| state.insert_role(tenant_id, name))
            .collect()
    }

    async fn permission_catalog(&mut self) -> StoreResult<Vec<Permission>> {
        self.store.permission_catalog().await
    }

    async fn insert_grants(&mut self, role: &Role, permission_ids: &[PermissionId]) -> StoreResult<()> {
        self.store
            .write()?
            .insert_grants(role.tenant_id, role.id, permission_ids)
            .map(|_| ())
    }

    async fn insert_user(&mut self, tenant_id: TenantId, user: &NewUser) -> StoreResult<User> {
        self.store.write()?.insert_user(tenant_id, user)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl ProvisioningStore for MemoryStore {
    fn atomicity(&self) -> Atomicity {
        Atomicity::Compensating
    }

    async fn begin<'a>(&'a self) -> StoreResult<Box<dyn ProvisioningSteps + 'a>> {
        Ok(Box::new(MemorySteps { store: self }))
    }

    async fn delete_tenant_cascade(&self, tenant_id: TenantId) -> StoreResult<()> {
        self.write()?.delete_tenant_cascade(tenant_id)
    }
}

#[async_trait]
impl TenantDirectory for MemoryStore {
    async fn tenant(&self, scope: &TenantScope) -> StoreResult<Tenant> {
        self.find_tenant(scope.tenant_id()).await
    }

    async fn update_tenant(&self, scope: &TenantScope, patch: &TenantPatch) -> StoreResult<Tenant> {
        let mut state = self.write()?;
        let tenant = state
            .tenants
            .get_mut(scope.tenant_id())
            .ok_or(StoreError::NotFound)?;
        patch.apply(tenant);
        Ok(tenant.clone())
    }

    async fn delete_tenant(&self, scope: &TenantScope) -> StoreResult<()> {
        self.write()?.delete_tenant_cascade(scope.tenant_id())
    }

    async fn find_tenant(&self, tenant_id: TenantId) -> StoreResult<Tenant> {
        self.read()?
            .tenants
            .get(tenant_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, scope: &TenantScope, user: &NewUser) -> StoreResult<User> {
        self.write()?.insert_user(scope.tenant_id(), user)
    }

    async fn user(&self, scope: &TenantScope, id: UserId) -> StoreResult<User> {
        self.read()?
            .users
            .get(id)
            .filter(|u| u.tenant_id == scope.tenant_id())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn users(&self, scope: &TenantScope) -> StoreResult<Vec<User>> {
        Ok(self.read()?.users.filtered(|u| u.tenant_id == scope.tenant_id()))
    }

    async fn update_user(
        &self,
        scope: &TenantScope,
        id: UserId,
        changes: &UserChanges,
    ) -> StoreResult<User> {
        let mut state = self.write()?;
        state
            .users
            .get(id)
            .filter(|u| u.tenant_id == scope.tenant_id())
            .ok_or(StoreError::NotFound)?;
        if let Some(role_id) = changes.role_id {
            state.role_in(scope.tenant_id(), role_id)?;
        }
        if let Some(username) = &changes.username {
            state.check_username_free(username, Some(id))?;
        }
        let user = state.users.get_mut(id).ok_or(StoreError::NotFound)?;
        changes.apply(user);
        Ok(user.clone())
    }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn create_customer(&self, scope: &TenantScope, draft: &CustomerDraft) -> StoreResult<Customer> {
        let mut state = self.write()?;
        state.tenant_exists(scope.tenant_id())?;
        Ok(state.customers.insert_with(|id| Customer {
            id,
            name: draft.name.clone(),
            email: draft.email.clone(),
            tenant_id: scope.tenant_id(),
            is_deleted: false,
        }))
    }

    async fn customer(&self, scope: &TenantScope, id: CustomerId) -> StoreResult<Customer> {
        self.read()?.visible_customer(scope, id).cloned()
    }

    async fn customers(&self, scope: &TenantScope) -> StoreResult<Vec<Customer>> {
        Ok(self
            .read()?
            .customers
            .filtered(|c| c.tenant_id == scope.tenant_id() && !c.is_deleted))
    }

    async fn update_customer(
        &self,
        scope: &TenantScope,
        id: CustomerId,
        patch: &CustomerPatch,
    ) -> StoreResult<Customer> {
        let mut state = self.write()?;
        state.visible_customer(scope, id)?;
        let customer = state.customers.get_mut(id).ok_or(StoreError::NotFound)?;
        patch.apply(customer);
        Ok(customer.clone())
    }

    async fn delete_customer(&self, scope: &TenantScope, id: CustomerId) -> StoreResult<()> {
        let mut state = self.write()?;
        state.visible_customer(scope, id)?;
        if let Some(customer) = state.customers.get_mut(id) {
            customer.is_deleted = true;
        }
        Ok(())
    }
}

#[async_trait]
impl InventoryRepository for MemoryStore {
    async fn create_item(
        &self,
        scope: &TenantScope,
        draft: &InventoryItemDraft,
    ) -> StoreResult<InventoryItem> {
        let mut state = self.write()?;
        state.tenant_exists(scope.tenant_id())?;
        Ok(state.items.insert_with(|id| InventoryItem {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            price_cents: draft.price_cents,
            tenant_id: scope.tenant_id(),
            is_deleted: false,
        }))
    }

    async fn item(&self, scope: &TenantScope, id: InventoryItemId) -> StoreResult<InventoryItem> {
        self.read()?.visible_item(scope, id).cloned()
    }

    async fn items(&self, scope: &TenantScope) -> StoreResult<Vec<InventoryItem>> {
        Ok(self
            .read()?
            .items
            .filtered(|i| i.tenant_id == scope.tenant_id() && !i.is_deleted))
    }

    async fn search_items(&self, scope: &TenantScope, needle: &str) -> StoreResult<Vec<InventoryItem>> {
        Ok(self.read()?.items.filtered(|i| {
            i.tenant_id == scope.tenant_id() && !i.is_deleted && i.name_matches(needle)
        }))
    }

    async fn update_item(
        &self,
        scope: &TenantScope,
        id: InventoryItemId,
        patch: &InventoryItemPatch,
    ) -> StoreResult<InventoryItem> {
        let mut state = self.write()?;
        state.visible_item(scope, id)?;
        let item = state.items.get_mut(id).ok_or(StoreError::NotFound)?;
        patch.apply(item);
        Ok(item.clone())
    }

    async fn delete_item(&self, scope: &TenantScope, id: InventoryItemId) -> StoreResult<()> {
        let mut state = self.write()?;
        state.visible_item(scope, id)?;
        if let Some(item) = state.items.get_mut(id) {
            item.is_deleted = true;
        }
        Ok(())
    }
}

#[async_trait]
impl StockRepository for MemoryStore {
    async fn create_stock(&self, scope: &TenantScope, draft: &StockDraft) -> StoreResult<StockView> {
        let mut state = self.write()?;
        let item_name = state.visible_item(scope, draft.inventory_item_id)?.name.clone();
        let stock = state.stock.insert_with(|id| Stock {
            id,
            inventory_item_id: draft.inventory_item_id,
            quantity: draft.quantity,
            manufacturing_date: draft.manufacturing_date,
            expiration_date: draft.expiration_date,
            batch_number: draft.batch_number.clone(),
        });
        Ok(StockView {
            stock,
            inventory_item_name: item_name,
        })
    }

    async fn stock(&self, scope: &TenantScope, id: StockId) -> StoreResult<StockView> {
        self.read()?.visible_stock(scope, id)
    }

    async fn stock_for_item(
        &self,
        scope: &TenantScope,
        item_id: InventoryItemId,
    ) -> StoreResult<Vec<StockView>> {
        let state = self.read()?;
        let item = state.visible_item(scope, item_id)?;
        Ok(state
            .stock
            .filtered(|s| s.inventory_item_id == item_id)
            .into_iter()
            .map(|stock| StockView {
                stock,
                inventory_item_name: item.name.clone(),
            })
            .collect())
    }

    async fn all_stock(&self, scope: &TenantScope) -> StoreResult<Vec<StockView>> {
        let state = self.read()?;
        Ok(state
            .stock
            .values()
            .filter_map(|s| state.visible_stock(scope, s.id).ok())
            .collect())
    }

    async fn update_stock(
        &self,
        scope: &TenantScope,
        id: StockId,
        patch: &StockPatch,
    ) -> StoreResult<StockView> {
        let mut state = self.write()?;
        let mut view = state.visible_stock(scope, id)?;
        let stock = state.stock.get_mut(id).ok_or(StoreError::NotFound)?;
        patch.apply(stock);
        view.stock = stock.clone();
        Ok(view)
    }

    async fn delete_stock(&self, scope: &TenantScope, id: StockId) -> StoreResult<()> {
        let mut state = self.write()?;
        state.visible_stock(scope, id)?;
        state.stock.remove(id);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn create_order(
        &self,
        scope: &TenantScope,
        customer_id: CustomerId,
        order_date: DateTime<Utc>,
        status: OrderStatus,
    ) -> StoreResult<Order> {
        let mut state = self.write()?;
        state.visible_customer(scope, customer_id)?;
        Ok(state.orders.insert_with(|id| Order {
            id,
            customer_id,
            tenant_id: scope.tenant_id(),
            order_date,
            status,
        }))
    }

    async fn order(&self, scope: &TenantScope, id: OrderId) -> StoreResult<Order> {
        self.read()?.scoped_order(scope, id).cloned()
    }

    async fn orders(&self, scope: &TenantScope) -> StoreResult<Vec<Order>> {
        Ok(self.read()?.orders.filtered(|o| o.tenant_id == scope.tenant_id()))
    }

    async fn update_order_status(
        &self,
        scope: &TenantScope,
        id: OrderId,
        status: OrderStatus,
    ) -> StoreResult<Order> {
        let mut state = self.write()?;
        state.scoped_order(scope, id)?;
        let order = state.orders.get_mut(id).ok_or(StoreError::NotFound)?;
        order.status = status;
        Ok(order.clone())
    }

    async fn add_order_item(
        &self,
        scope: &TenantScope,
        order_id: OrderId,
        draft: &OrderItemDraft,
    ) -> StoreResult<OrderItem> {
        let mut state = self.write()?;
        state.scoped_order(scope, order_id)?;
        let price_cents = state.visible_item(scope, draft.inventory_item_id)?.price_cents;
        Ok(state.order_items.insert_with(|id| OrderItem {
            id,
            order_id,
            inventory_item_id: draft.inventory_item_id,
            quantity: draft.quantity,
            price_cents,
        }))
    }

    async fn order_items(&self, scope: &TenantScope, order_id: OrderId) -> StoreResult<Vec<OrderItem>> {
        let state = self.read()?;
        state.scoped_order(scope, order_id)?;
        Ok(state.order_items.filtered(|l| l.order_id == order_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workstream_auth::DEFAULT_CATALOG;

    #[tokio::test]
    async fn runs_the_tenant_scope_conformance_suite() {
        let store = MemoryStore::new();
        store.seed_permissions(&DEFAULT_CATALOG).unwrap();
        crate::conformance::run_all(std::sync::Arc::new(store)).await;
    }

    #[test]
    fn seeding_is_idempotent() {
        let store = MemoryStore::new();
        store.seed_permissions(&["A", "B"]).unwrap();
        let catalog = store.seed_permissions(&["B", "C", " "]).unwrap();
        let names: Vec<_> = catalog.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}
