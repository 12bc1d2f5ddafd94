//! `workstream-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod validate;

pub use entity::{Entity, SoftDeletable, TenantOwned};
pub use error::{DomainError, DomainResult, StoreError, StoreResult};
pub use id::{
    CustomerId, InventoryItemId, OrderId, OrderItemId, PermissionId, RoleId, StockId, TenantId,
    UserId,
};
