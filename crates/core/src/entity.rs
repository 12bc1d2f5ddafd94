//! Entity contracts: identity, tenant ownership, soft deletion.

use crate::id::TenantId;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// An entity owned by exactly one tenant.
///
/// Storage backends filter every read and write of such entities by the
/// tenant of the caller's verified session.
pub trait TenantOwned: Entity {
    fn tenant_id(&self) -> TenantId;
}

/// An entity that is flagged rather than removed.
///
/// Flagged rows are excluded from every default read.
pub trait SoftDeletable {
    fn is_deleted(&self) -> bool;

    fn mark_deleted(&mut self);
}
