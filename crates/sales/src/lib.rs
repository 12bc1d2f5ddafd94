//! Sales domain module: orders and their lines.
//!
//! Pure records and field rules (no IO, no HTTP, no storage). Totals and stock
//! reservation are not modelled.

pub mod order;

pub use order::{Order, OrderDraft, OrderItem, OrderItemDraft, OrderStatus, OrderStatusUpdate, OrderWithItems};
