//! Domain and storage error models.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures (validation, malformed ids).
/// Storage concerns are reported through [`StoreError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// Error returned by every storage backend.
///
/// `NotFound` deliberately covers both "no such row" and "row owned by another
/// tenant": callers must not be able to tell the two apart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint was violated (e.g. duplicate username).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend itself failed (connection, serialization, poisoned lock).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
