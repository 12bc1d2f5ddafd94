//! Tenant-scope conformance suite, runnable against any [`Store`].
//!
//! Two tenants are provisioned and logged in through the real token path, so
//! every scope used here comes from a verified session. Each check creates a
//! row as tenant A and asserts that tenant B cannot read, change, delete or
//! reference it, and that the failure is the same `NotFound` a missing row
//! produces.
//!
//! The store must have the default permission catalog seeded. Usernames are
//! randomized so the suite can run against a persistent database.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use workstream_auth::{
    permissions::{CUSTOMER_MANAGEMENT, INVENTORY_MANAGEMENT},
    Authenticator, NewUser, OwnerDraft, PasswordHasher, PermissionResolver, ProvisionRequest,
    Provisioner, RbacError, RbacStore, Session, TenantDraft, TenantPatch, TokenConfig, TokenService,
    UserChanges,
};
use workstream_core::{CustomerId, StoreError, UserId};
use workstream_inventory::{InventoryItemDraft, InventoryItemPatch, StockDraft, StockPatch};
use workstream_parties::{CustomerDraft, CustomerPatch};
use workstream_sales::{OrderItemDraft, OrderStatus};

use crate::repository::Store;

/// bcrypt's minimum work factor; the suite is about scoping, not hashing.
const SUITE_HASH_COST: u32 = 4;
const PASSWORD: &str = "correct horse battery staple";

pub struct Fixture<S> {
    pub store: Arc<S>,
    pub tokens: Arc<TokenService>,
    pub a: Session,
    pub b: Session,
}

fn is_not_found<T>(result: Result<T, StoreError>) -> bool {
    matches!(result, Err(StoreError::NotFound))
}

/// Provision a tenant and return a session for its owner.
pub async fn provision_and_login<S: Store + 'static>(
    store: &Arc<S>,
    tokens: &Arc<TokenService>,
    company: &str,
) -> Session {
    let hasher = PasswordHasher::with_cost(SUITE_HASH_COST);
    let username = format!("owner-{}", Uuid::now_v7().simple());

    let provisioner = Provisioner::new(store.clone(), hasher);
    provisioner
        .provision(&ProvisionRequest {
            tenant: TenantDraft {
                company_name: company.to_string(),
                contact_email: format!("ops@{}.example", company.to_lowercase()),
            },
            owner: OwnerDraft {
                username: username.clone(),
                password: PASSWORD.to_string(),
            },
        })
        .await
        .expect("provisioning succeeds");

    let login = Authenticator::new(store.clone(), tokens.clone(), hasher);
    let issued = login.login(&username, PASSWORD).await.expect("owner can log in");
    tokens.authenticate(&issued.token).expect("issued token authenticates")
}

pub async fn fixture<S: Store + 'static>(store: Arc<S>) -> Fixture<S> {
    let tokens = Arc::new(TokenService::new(TokenConfig::new(
        b"conformance-suite-secret".to_vec(),
        "workstream",
        "workstream-api",
    )));
    let a = provision_and_login(&store, &tokens, "Alpha").await;
    let b = provision_and_login(&store, &tokens, "Beta").await;
    assert_ne!(a.tenant_id(), b.tenant_id());
    Fixture { store, tokens, a, b }
}

pub async fn run_all<S: Store + 'static>(store: Arc<S>) {
    let fx = fixture(store).await;
    customers_are_isolated(&fx).await;
    inventory_is_isolated(&fx).await;
    stock_is_scoped_through_its_item(&fx).await;
    orders_are_isolated(&fx).await;
    users_and_roles_are_isolated(&fx).await;
    tenant_delete_cascades(&fx).await;
}

pub async fn customers_are_isolated<S: Store>(fx: &Fixture<S>) {
    let store = &fx.store;
    let (a, b) = (&fx.a.scope, &fx.b.scope);

    let c = store
        .create_customer(a, &CustomerDraft { name: "Globex".into(), email: "buy@globex.io".into() })
        .await
        .expect("create customer");

    assert!(is_not_found(store.customer(b, c.id).await));
    assert!(is_not_found(
        store
            .update_customer(b, c.id, &CustomerPatch { name: Some("Hijacked".into()), ..Default::default() })
            .await
    ));
    assert!(is_not_found(store.delete_customer(b, c.id).await));
    assert!(store.customers(b).await.unwrap().iter().all(|x| x.id != c.id));

    // Indistinguishable from an id that was never issued.
    assert!(is_not_found(store.customer(b, CustomerId::new(i64::MAX)).await));

    assert_eq!(store.customer(a, c.id).await.unwrap().name, "Globex");

    store.delete_customer(a, c.id).await.expect("soft delete");
    assert!(is_not_found(store.customer(a, c.id).await));
    assert!(store.customers(a).await.unwrap().iter().all(|x| x.id != c.id));
    assert!(is_not_found(store.update_customer(a, c.id, &CustomerPatch::default()).await));
    assert!(is_not_found(store.delete_customer(a, c.id).await));
}

pub async fn inventory_is_isolated<S: Store>(fx: &Fixture<S>) {
    let store = &fx.store;
    let (a, b) = (&fx.a.scope, &fx.b.scope);

    let item = store
        .create_item(
            a,
            &InventoryItemDraft { name: "Sprocket".into(), description: None, price_cents: 500 },
        )
        .await
        .expect("create item");

    assert!(is_not_found(store.item(b, item.id).await));
    assert!(store.search_items(b, "sprock").await.unwrap().is_empty());
    assert!(is_not_found(
        store
            .update_item(b, item.id, &InventoryItemPatch { price_cents: Some(1), ..Default::default() })
            .await
    ));
    assert!(is_not_found(store.delete_item(b, item.id).await));

    let found = store.search_items(a, "SPROCK").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(store.item(a, item.id).await.unwrap().price_cents, 500);

    store.delete_item(a, item.id).await.expect("soft delete");
    assert!(is_not_found(store.item(a, item.id).await));
    assert!(store.search_items(a, "sprock").await.unwrap().is_empty());
}

pub async fn stock_is_scoped_through_its_item<S: Store>(fx: &Fixture<S>) {
    let store = &fx.store;
    let (a, b) = (&fx.a.scope, &fx.b.scope);
    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).expect("valid date");

    let item = store
        .create_item(a, &InventoryItemDraft { name: "Flux".into(), description: None, price_cents: 90 })
        .await
        .unwrap();
    let draft = StockDraft {
        inventory_item_id: item.id,
        quantity: 10,
        manufacturing_date: date(2025, 1, 1),
        expiration_date: date(2026, 1, 1),
        batch_number: "FX-1".into(),
    };

    assert!(is_not_found(store.create_stock(b, &draft).await));
    let stock = store.create_stock(a, &draft).await.expect("create stock");
    assert_eq!(stock.inventory_item_name, "Flux");

    assert!(is_not_found(store.stock(b, stock.stock.id).await));
    assert!(is_not_found(store.stock_for_item(b, item.id).await));
    assert!(store.all_stock(b).await.unwrap().is_empty());
    let patch = StockPatch { quantity: Some(0), ..Default::default() };
    assert!(is_not_found(store.update_stock(b, stock.stock.id, &patch).await));
    assert!(is_not_found(store.delete_stock(b, stock.stock.id).await));

    let updated = store.update_stock(a, stock.stock.id, &patch).await.unwrap();
    assert_eq!(updated.stock.quantity, 0);
    assert_eq!(store.stock_for_item(a, item.id).await.unwrap().len(), 1);

    store.delete_stock(a, stock.stock.id).await.expect("hard delete");
    assert!(is_not_found(store.stock(a, stock.stock.id).await));

    // Stock of a soft-deleted item is hidden with it.
    let again = store.create_stock(a, &draft).await.unwrap();
    store.delete_item(a, item.id).await.unwrap();
    assert!(is_not_found(store.stock(a, again.stock.id).await));
    assert!(is_not_found(store.create_stock(a, &draft).await));
}

pub async fn orders_are_isolated<S: Store>(fx: &Fixture<S>) {
    let store = &fx.store;
    let (a, b) = (&fx.a.scope, &fx.b.scope);

    let customer = store
        .create_customer(a, &CustomerDraft { name: "Initech".into(), email: "it@initech.io".into() })
        .await
        .unwrap();
    let item = store
        .create_item(a, &InventoryItemDraft { name: "Stapler".into(), description: None, price_cents: 1999 })
        .await
        .unwrap();

    // B cannot place an order for A's customer.
    assert!(is_not_found(
        store.create_order(b, customer.id, Utc::now(), OrderStatus::Pending).await
    ));

    let order = store
        .create_order(a, customer.id, Utc::now(), OrderStatus::Pending)
        .await
        .expect("create order");
    assert!(is_not_found(store.order(b, order.id).await));
    assert!(is_not_found(store.update_order_status(b, order.id, OrderStatus::Cancelled).await));
    assert!(is_not_found(store.order_items(b, order.id).await));

    let line = OrderItemDraft { inventory_item_id: item.id, quantity: 3 };
    assert!(is_not_found(store.add_order_item(b, order.id, &line).await));

    // B's own order cannot reference A's item.
    let b_customer = store
        .create_customer(b, &CustomerDraft { name: "Hooli".into(), email: "x@hooli.io".into() })
        .await
        .unwrap();
    let b_order = store
        .create_order(b, b_customer.id, Utc::now(), OrderStatus::Pending)
        .await
        .unwrap();
    assert!(is_not_found(store.add_order_item(b, b_order.id, &line).await));

    let added = store.add_order_item(a, order.id, &line).await.expect("add line");
    assert_eq!(added.price_cents, 1999);
    assert_eq!(added.line_total_cents(), 5997);
    assert_eq!(store.order_items(a, order.id).await.unwrap().len(), 1);
    assert!(is_not_found(store.order_items(b, order.id).await));

    let shipped = store
        .update_order_status(a, order.id, OrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(shipped.status, OrderStatus::Shipped);

    store.delete_item(a, item.id).await.unwrap();
    assert!(is_not_found(store.add_order_item(a, order.id, &line).await));
}

pub async fn users_and_roles_are_isolated<S: Store>(fx: &Fixture<S>) {
    let store = &fx.store;
    let (a, b) = (&fx.a.scope, &fx.b.scope);
    let a_role = fx.a.role_id.expect("owner has a role");

    // A role of tenant A cannot be given to a user of tenant B.
    let new_user = NewUser {
        username: format!("mallory-{}", Uuid::now_v7().simple()),
        credential_hash: "x".into(),
        role_id: Some(a_role),
    };
    assert!(is_not_found(store.create_user(b, &new_user).await));

    let b_owner = store.user(b, fx.b.user_id).await.expect("own user");
    assert!(is_not_found(
        store
            .update_user(b, b_owner.id, &UserChanges { role_id: Some(a_role), ..Default::default() })
            .await
    ));

    assert!(is_not_found(store.user(b, fx.a.user_id).await));
    assert!(store.users(b).await.unwrap().iter().all(|u| u.tenant_id == b.tenant_id()));
    assert!(is_not_found(store.user(a, UserId::new(i64::MAX)).await));

    // Usernames are global.
    let dup = NewUser { username: fx.a.username.clone(), credential_hash: "x".into(), role_id: None };
    assert!(matches!(store.create_user(b, &dup).await, Err(StoreError::Conflict(_))));

    let resolver = PermissionResolver::new(store.clone());
    assert!(matches!(
        resolver.role_with_permissions(b, a_role).await,
        Err(RbacError::NotFound)
    ));
    assert!(matches!(
        resolver
            .replace_permissions(b, a_role, &[INVENTORY_MANAGEMENT.as_str()])
            .await,
        Err(RbacError::NotFound)
    ));
    assert!(matches!(
        resolver
            .assign_permissions(b, a_role, &[INVENTORY_MANAGEMENT.as_str()])
            .await,
        Err(RbacError::NotFound)
    ));
    assert!(is_not_found(
        store
            .insert_grants(b.tenant_id(), a_role, &[])
            .await
    ));
    assert!(resolver.roles(b).await.unwrap().iter().all(|r| r.tenant_id == b.tenant_id()));

    // The A owner still holds the full catalog.
    assert!(
        resolver
            .has_permission(a_role, a.tenant_id(), CUSTOMER_MANAGEMENT.as_str())
            .await
            .unwrap()
    );
    assert!(
        !resolver
            .has_permission(a_role, b.tenant_id(), CUSTOMER_MANAGEMENT.as_str())
            .await
            .unwrap()
    );

    let renamed = store
        .update_tenant(b, &TenantPatch { company_name: Some("Beta Two".into()), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(renamed.id, b.tenant_id());
    assert_eq!(store.tenant(a).await.unwrap().company_name, "Alpha");
}

pub async fn tenant_delete_cascades<S: Store + 'static>(fx: &Fixture<S>) {
    let store = &fx.store;
    let c = provision_and_login(store, &fx.tokens, "Gamma").await;
    let scope = &c.scope;

    let customer = store
        .create_customer(scope, &CustomerDraft { name: "Soylent".into(), email: "s@soylent.io".into() })
        .await
        .unwrap();
    let item = store
        .create_item(scope, &InventoryItemDraft { name: "Green".into(), description: None, price_cents: 1 })
        .await
        .unwrap();
    let order = store
        .create_order(scope, customer.id, Utc::now(), OrderStatus::Pending)
        .await
        .unwrap();
    store
        .add_order_item(scope, order.id, &OrderItemDraft { inventory_item_id: item.id, quantity: 1 })
        .await
        .unwrap();

    store.delete_tenant(scope).await.expect("delete tenant");

    assert!(is_not_found(store.find_tenant(c.tenant_id()).await));
    assert!(is_not_found(store.user_by_username(&c.username).await));
    assert!(store.roles(c.tenant_id()).await.unwrap().is_empty());
    assert!(store.customers(scope).await.unwrap().is_empty());
    assert!(store.items(scope).await.unwrap().is_empty());
    assert!(store.orders(scope).await.unwrap().is_empty());
    assert!(is_not_found(store.item(scope, item.id).await));

    // Other tenants are untouched.
    assert!(store.find_tenant(fx.a.tenant_id()).await.is_ok());
}
