//! Customer domain module.
//!
//! Records, drafts and patches with their field rules. No IO, no HTTP, no
//! storage; tenant scoping is applied by the repositories in `workstream-infra`.

pub mod customer;

pub use customer::{Customer, CustomerDraft, CustomerPatch};
