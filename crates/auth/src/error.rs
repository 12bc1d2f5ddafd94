//! Error taxonomy of the authorization core.

use thiserror::Error;

use workstream_core::{DomainError, StoreError};

use crate::credentials::CredentialError;

/// Request-time failures.
///
/// `Authentication` never says which check failed; the precise reason is
/// logged where it is detected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("unauthenticated")]
    Authentication,

    #[error("forbidden: missing permission '{0}'")]
    AuthorizationDenied(String),

    #[error(transparent)]
    Backend(#[from] StoreError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Token issuance failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("role does not belong to the user's tenant")]
    RoleMismatch,
}

/// Role and grant management failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RbacError {
    #[error("permissions not found: {}", missing.join(", "))]
    PermissionNotFound { missing: Vec<String> },

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RbacError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

/// Step of the provisioning workflow that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningStep {
    CreateTenant,
    ProvisionRoles,
    ProvisionGrants,
    CreateOwner,
    Commit,
}

impl core::fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::CreateTenant => "create_tenant",
            Self::ProvisionRoles => "provision_roles",
            Self::ProvisionGrants => "provision_grants",
            Self::CreateOwner => "create_owner",
            Self::Commit => "commit",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProvisioningCause {
    /// No permissions exist in the catalog. A deployment problem; not retried.
    #[error("permission catalog is empty")]
    CatalogEmpty,

    #[error("default role '{0}' was not created")]
    OwnerRoleMissing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProvisioningError {
    #[error(transparent)]
    InvalidRequest(#[from] DomainError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The tenant and everything provisioned under it are absent when this
    /// is returned, unless `compensated` is `false` (compensation itself failed).
    #[error("provisioning failed at {step}: {cause}")]
    Failed {
        step: ProvisioningStep,
        cause: ProvisioningCause,
        compensated: bool,
    },
}

impl ProvisioningError {
    pub fn is_catalog_empty(&self) -> bool {
        matches!(
            self,
            Self::Failed {
                cause: ProvisioningCause::CatalogEmpty,
                ..
            }
        )
    }
}
