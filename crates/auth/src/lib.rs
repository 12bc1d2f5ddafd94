//! `workstream-auth` is the authorization core: session tokens, role grants,
//! tenant provisioning and the tenant scope every data access is filtered by.
//!
//! This crate is intentionally decoupled from HTTP and concrete storage.

pub mod authorize;
pub mod claims;
pub mod config;
pub mod credentials;
pub mod error;
pub mod login;
pub mod permissions;
pub mod principal;
pub mod provision;
pub mod resolver;
pub mod roles;
pub mod store;
pub mod tenant;
pub mod token;
pub mod user;

pub use authorize::{authenticate, authorize};
pub use claims::{validate_claims, SessionClaims, TokenValidationError, NO_ROLE};
pub use config::TokenConfig;
pub use credentials::{CredentialError, PasswordHasher};
pub use error::{AuthError, ProvisioningCause, ProvisioningError, ProvisioningStep, RbacError, TokenError};
pub use login::Authenticator;
pub use permissions::{Permission, PermissionName, RolePermission, DEFAULT_CATALOG};
pub use principal::{Session, TenantScope};
pub use provision::{ProvisionRequest, ProvisionedTenant, Provisioner, ProvisioningState};
pub use resolver::PermissionResolver;
pub use roles::{Role, RoleWithPermissions, DEFAULT_ROLES};
pub use store::{Atomicity, CredentialStore, ProvisioningSteps, ProvisioningStore, RbacStore};
pub use tenant::{Tenant, TenantDraft, TenantPatch};
pub use token::{extract_bearer, IssuedToken, TokenService};
pub use user::{NewUser, OwnerDraft, User, UserChanges, UserDraft, UserInputError, UserPatch};

