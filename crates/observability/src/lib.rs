//! Tracing and logging setup shared by every binary.

/// Subscriber configuration (filters, formatters).
pub mod tracing;

pub use self::tracing::{init, init_with, LogFormat};
