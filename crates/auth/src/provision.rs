//! Tenant provisioning: tenant, default roles, owner grants and owner user
//! as one unit.
//!
//! The run is a linear state machine. On a backend with
//! [`Atomicity::Native`] every step shares one transaction and a failure is a
//! rollback. On an [`Atomicity::Compensating`] backend each step is durable
//! and a failure after the tenant row exists deletes the tenant cascade. In
//! both cases a failed run leaves nothing behind.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use workstream_core::{PermissionId, StoreError, TenantId};

use crate::credentials::PasswordHasher;
use crate::error::{ProvisioningCause, ProvisioningError, ProvisioningStep};
use crate::roles::{Role, DEFAULT_ROLES, OWNER};
use crate::store::{Atomicity, ProvisioningSteps, ProvisioningStore};
use crate::tenant::{Tenant, TenantDraft};
use crate::user::{validate_username, NewUser, OwnerDraft, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningState {
    Pending,
    Created,
    RolesProvisioned,
    GrantsProvisioned,
    OwnerCreated,
    Committed,
    Compensated,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionRequest {
    pub tenant: TenantDraft,
    pub owner: OwnerDraft,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvisionedTenant {
    pub tenant: Tenant,
    pub owner: User,
    pub roles: Vec<Role>,
}

pub struct Provisioner<S> {
    store: S,
    hasher: PasswordHasher,
}

impl<S: ProvisioningStore> Provisioner<S> {
    pub fn new(store: S, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    #[instrument(skip_all, fields(company = %request.tenant.company_name))]
    pub async fn provision(&self, request: &ProvisionRequest) -> Result<ProvisionedTenant, ProvisioningError> {
        // Everything that can be checked without the store is checked first.
        let draft = request.tenant.validated()?;
        let username = validate_username(&request.owner.username)?;
        if request.owner.password.is_empty() {
            return Err(workstream_core::DomainError::validation("password must not be empty").into());
        }
        let credential_hash = self.hasher.hash(&request.owner.password)?;

        let mut steps = self.store.begin().await.map_err(|e| ProvisioningError::Failed {
            step: ProvisioningStep::CreateTenant,
            cause: e.into(),
            compensated: true,
        })?;

        let mut run = Run {
            state: ProvisioningState::Pending,
            tenant_id: None,
        };

        match run
            .execute(steps.as_mut(), &draft, &username, credential_hash)
            .await
        {
            Ok(provisioned) => {
                if let Err(e) = steps.commit().await {
                    let compensated = self.undo_after_commit_failure(provisioned.tenant.id).await;
                    return Err(ProvisioningError::Failed {
                        step: ProvisioningStep::Commit,
                        cause: e.into(),
                        compensated,
                    });
                }
                run.advance(ProvisioningState::Committed);
                Ok(provisioned)
            }
            Err((step, cause)) => {
                tracing::warn!(%step, error = %cause, "provisioning step failed");
                let compensated = self.undo(steps, run.tenant_id).await;
                if compensated {
                    run.advance(ProvisioningState::Compensated);
                }
                Err(ProvisioningError::Failed {
                    step,
                    cause,
                    compensated,
                })
            }
        }
    }

    async fn undo(&self, steps: Box<dyn ProvisioningSteps + '_>, tenant_id: Option<TenantId>) -> bool {
        let rolled_back = match steps.rollback().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "provisioning rollback failed");
                false
            }
        };
        match (self.store.atomicity(), tenant_id) {
            (Atomicity::Native, _) | (Atomicity::Compensating, None) => rolled_back,
            (Atomicity::Compensating, Some(tenant_id)) => self.compensate(tenant_id).await,
        }
    }

    /// A native commit that fails has already rolled back; a compensating
    /// backend should never fail here, but if it does the tenant is removed.
    async fn undo_after_commit_failure(&self, tenant_id: TenantId) -> bool {
        match self.store.atomicity() {
            Atomicity::Native => true,
            Atomicity::Compensating => self.compensate(tenant_id).await,
        }
    }

    async fn compensate(&self, tenant_id: TenantId) -> bool {
        match self.store.delete_tenant_cascade(tenant_id).await {
            Ok(()) | Err(StoreError::NotFound) => {
                tracing::info!(%tenant_id, "provisioning compensated");
                true
            }
            Err(e) => {
                tracing::error!(%tenant_id, error = %e, "provisioning compensation failed");
                false
            }
        }
    }
}

struct Run {
    state: ProvisioningState,
    tenant_id: Option<TenantId>,
}

type StepFailure = (ProvisioningStep, ProvisioningCause);

fn at(step: ProvisioningStep) -> impl FnOnce(StoreError) -> StepFailure {
    move |e| (step, ProvisioningCause::Store(e))
}

impl Run {
    fn advance(&mut self, next: ProvisioningState) {
        tracing::debug!(from = ?self.state, to = ?next, tenant_id = ?self.tenant_id, "provisioning state");
        self.state = next;
    }

    async fn execute(
        &mut self,
        steps: &mut (dyn ProvisioningSteps + '_),
        draft: &TenantDraft,
        username: &str,
        credential_hash: String,
    ) -> Result<ProvisionedTenant, StepFailure> {
        let tenant = steps
            .insert_tenant(draft)
            .await
            .map_err(at(ProvisioningStep::CreateTenant))?;
        self.tenant_id = Some(tenant.id);
        self.advance(ProvisioningState::Created);

        let roles = steps
            .insert_roles(tenant.id, &DEFAULT_ROLES)
            .await
            .map_err(at(ProvisioningStep::ProvisionRoles))?;
        self.advance(ProvisioningState::RolesProvisioned);

        let owner_role = roles
            .iter()
            .find(|r| r.name == OWNER)
            .cloned()
            .ok_or_else(|| {
                (
                    ProvisioningStep::ProvisionRoles,
                    ProvisioningCause::OwnerRoleMissing(OWNER.to_string()),
                )
            })?;

        let catalog = steps
            .permission_catalog()
            .await
            .map_err(at(ProvisioningStep::ProvisionGrants))?;
        if catalog.is_empty() {
            return Err((ProvisioningStep::ProvisionGrants, ProvisioningCause::CatalogEmpty));
        }
        let ids: Vec<PermissionId> = catalog.iter().map(|p| p.id).collect();
        steps
            .insert_grants(&owner_role, &ids)
            .await
            .map_err(at(ProvisioningStep::ProvisionGrants))?;
        self.advance(ProvisioningState::GrantsProvisioned);

        let owner = steps
            .insert_user(
                tenant.id,
                &NewUser {
                    username: username.to_string(),
                    credential_hash,
                    role_id: Some(owner_role.id),
                },
            )
            .await
            .map_err(at(ProvisioningStep::CreateOwner))?;
        self.advance(ProvisioningState::OwnerCreated);

        Ok(ProvisionedTenant { tenant, owner, roles })
    }
}
