//! Row types decoded from query results and converted into domain records.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use workstream_auth::{Permission, Role, Tenant, User};
use workstream_core::{
    CustomerId, InventoryItemId, OrderId, OrderItemId, PermissionId, RoleId, StockId, StoreError,
    TenantId, UserId,
};
use workstream_inventory::{InventoryItem, Stock, StockView};
use workstream_parties::Customer;
use workstream_sales::{Order, OrderItem, OrderStatus};

/// Decode one row into a domain record.
pub(super) fn decode<R, T>(row: &PgRow) -> Result<T, StoreError>
where
    R: for<'r> FromRow<'r, PgRow>,
    T: TryFrom<R, Error = StoreError>,
{
    let raw = R::from_row(row)
        .map_err(|e| StoreError::backend(format!("failed to decode row: {e}")))?;
    T::try_from(raw)
}

pub(super) fn decode_all<R, T>(rows: &[PgRow]) -> Result<Vec<T>, StoreError>
where
    R: for<'r> FromRow<'r, PgRow>,
    T: TryFrom<R, Error = StoreError>,
{
    rows.iter().map(decode::<R, T>).collect()
}

pub(super) struct TenantRow {
    id: i64,
    company_name: String,
    contact_email: String,
}

impl<'r> FromRow<'r, PgRow> for TenantRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(TenantRow {
            id: row.try_get("id")?,
            company_name: row.try_get("company_name")?,
            contact_email: row.try_get("contact_email")?,
        })
    }
}

impl TryFrom<TenantRow> for Tenant {
    type Error = StoreError;

    fn try_from(row: TenantRow) -> Result<Self, StoreError> {
        Ok(Tenant {
            id: TenantId::new(row.id),
            company_name: row.company_name,
            contact_email: row.contact_email,
        })
    }
}

pub(super) struct PermissionRow {
    id: i64,
    name: String,
}

impl<'r> FromRow<'r, PgRow> for PermissionRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(PermissionRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }
}

impl TryFrom<PermissionRow> for Permission {
    type Error = StoreError;

    fn try_from(row: PermissionRow) -> Result<Self, StoreError> {
        Ok(Permission {
            id: PermissionId::new(row.id),
            name: row.name,
        })
    }
}

pub(super) struct RoleRow {
    id: i64,
    name: String,
    tenant_id: i64,
}

impl<'r> FromRow<'r, PgRow> for RoleRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(RoleRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            tenant_id: row.try_get("tenant_id")?,
        })
    }
}

impl TryFrom<RoleRow> for Role {
    type Error = StoreError;

    fn try_from(row: RoleRow) -> Result<Self, StoreError> {
        Ok(Role {
            id: RoleId::new(row.id),
            name: row.name,
            tenant_id: TenantId::new(row.tenant_id),
        })
    }
}

pub(super) struct UserRow {
    id: i64,
    username: String,
    credential_hash: String,
    tenant_id: i64,
    role_id: Option<i64>,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            credential_hash: row.try_get("credential_hash")?,
            tenant_id: row.try_get("tenant_id")?,
            role_id: row.try_get("role_id")?,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, StoreError> {
        Ok(User {
            id: UserId::new(row.id),
            username: row.username,
            credential_hash: row.credential_hash,
            tenant_id: TenantId::new(row.tenant_id),
            role_id: row.role_id.map(RoleId::new),
        })
    }
}

pub(super) struct CustomerRow {
    id: i64,
    name: String,
    email: String,
    tenant_id: i64,
    is_deleted: bool,
}

impl<'r> FromRow<'r, PgRow> for CustomerRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CustomerRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            tenant_id: row.try_get("tenant_id")?,
            is_deleted: row.try_get("is_deleted")?,
        })
    }
}

impl TryFrom<CustomerRow> for Customer {
    type Error = StoreError;

    fn try_from(row: CustomerRow) -> Result<Self, StoreError> {
        Ok(Customer {
            id: CustomerId::new(row.id),
            name: row.name,
            email: row.email,
            tenant_id: TenantId::new(row.tenant_id),
            is_deleted: row.is_deleted,
        })
    }
}

pub(super) struct ItemRow {
    id: i64,
    name: String,
    description: Option<String>,
    price_cents: i64,
    tenant_id: i64,
    is_deleted: bool,
}

impl<'r> FromRow<'r, PgRow> for ItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ItemRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price_cents: row.try_get("price_cents")?,
            tenant_id: row.try_get("tenant_id")?,
            is_deleted: row.try_get("is_deleted")?,
        })
    }
}

impl TryFrom<ItemRow> for InventoryItem {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, StoreError> {
        Ok(InventoryItem {
            id: InventoryItemId::new(row.id),
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            tenant_id: TenantId::new(row.tenant_id),
            is_deleted: row.is_deleted,
        })
    }
}

/// Stock joined with its item name (`inventory_item_name`).
pub(super) struct StockRow {
    id: i64,
    inventory_item_id: i64,
    quantity: i64,
    manufacturing_date: NaiveDate,
    expiration_date: NaiveDate,
    batch_number: String,
    inventory_item_name: String,
}

impl<'r> FromRow<'r, PgRow> for StockRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(StockRow {
            id: row.try_get("id")?,
            inventory_item_id: row.try_get("inventory_item_id")?,
            quantity: row.try_get("quantity")?,
            manufacturing_date: row.try_get("manufacturing_date")?,
            expiration_date: row.try_get("expiration_date")?,
            batch_number: row.try_get("batch_number")?,
            inventory_item_name: row.try_get("inventory_item_name")?,
        })
    }
}

impl TryFrom<StockRow> for StockView {
    type Error = StoreError;

    fn try_from(row: StockRow) -> Result<Self, StoreError> {
        Ok(StockView {
            stock: Stock {
                id: StockId::new(row.id),
                inventory_item_id: InventoryItemId::new(row.inventory_item_id),
                quantity: row.quantity,
                manufacturing_date: row.manufacturing_date,
                expiration_date: row.expiration_date,
                batch_number: row.batch_number,
            },
            inventory_item_name: row.inventory_item_name,
        })
    }
}

pub(super) struct OrderRow {
    id: i64,
    customer_id: i64,
    tenant_id: i64,
    order_date: DateTime<Utc>,
    status: String,
}

impl<'r> FromRow<'r, PgRow> for OrderRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(OrderRow {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            tenant_id: row.try_get("tenant_id")?,
            order_date: row.try_get("order_date")?,
            status: row.try_get("status")?,
        })
    }
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, StoreError> {
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|_| StoreError::backend(format!("unknown order status '{}'", row.status)))?;
        Ok(Order {
            id: OrderId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            tenant_id: TenantId::new(row.tenant_id),
            order_date: row.order_date,
            status,
        })
    }
}

pub(super) struct OrderItemRow {
    id: i64,
    order_id: i64,
    inventory_item_id: i64,
    quantity: i64,
    price_cents: i64,
}

impl<'r> FromRow<'r, PgRow> for OrderItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(OrderItemRow {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            inventory_item_id: row.try_get("inventory_item_id")?,
            quantity: row.try_get("quantity")?,
            price_cents: row.try_get("price_cents")?,
        })
    }
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = StoreError;

    fn try_from(row: OrderItemRow) -> Result<Self, StoreError> {
        Ok(OrderItem {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            inventory_item_id: InventoryItemId::new(row.inventory_item_id),
            quantity: row.quantity,
            price_cents: row.price_cents,
        })
    }
}
