//! Inventory domain module: items and the stock batches held for them.
//!
//! Pure records and field rules (no IO, no HTTP, no storage).

pub mod item;
pub mod stock;

pub use item::{InventoryItem, InventoryItemDraft, InventoryItemPatch};
pub use stock::{Stock, StockDraft, StockPatch, StockView};
