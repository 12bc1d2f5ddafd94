//! Infrastructure layer: storage backends behind the auth store traits and
//! the tenant-scoped repositories.

pub mod memory;
pub mod postgres;
pub mod repository;

#[cfg(any(test, feature = "test-harness"))]
pub mod conformance;

mod integration_tests;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use repository::{
    CustomerRepository, InventoryRepository, OrderRepository, SharedStore, StockRepository, Store,
    TenantDirectory, UserRepository,
};
