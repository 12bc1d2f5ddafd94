use std::sync::Arc;

use tracing::instrument;

use workstream_core::StoreError;

use crate::credentials::PasswordHasher;
use crate::error::AuthError;
use crate::store::{CredentialStore, RbacStore};
use crate::token::{IssuedToken, TokenService};

/// Username/password login that ends in a session token.
pub struct Authenticator<S> {
    store: S,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
}

impl<S> Authenticator<S>
where
    S: CredentialStore + RbacStore,
{
    pub fn new(store: S, tokens: Arc<TokenService>, hasher: PasswordHasher) -> Self {
        Self {
            store,
            tokens,
            hasher,
        }
    }

    /// Unknown user and wrong password both come back as
    /// [`AuthError::Authentication`].
    #[instrument(skip_all, fields(username = %username))]
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let user = match self.store.user_by_username(username.trim()).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                tracing::info!("login rejected: unknown user");
                return Err(AuthError::Authentication);
            }
            Err(e) => return Err(e.into()),
        };

        if !self.hasher.verify(password, &user.credential_hash) {
            tracing::info!(user_id = %user.id, "login rejected: bad credentials");
            return Err(AuthError::Authentication);
        }

        let role = match user.role_id {
            Some(role_id) => match self.store.role(user.tenant_id, role_id).await {
                Ok(role) => Some(role),
                Err(StoreError::NotFound) => {
                    tracing::warn!(user_id = %user.id, %role_id, "user references a missing role");
                    return Err(AuthError::Authentication);
                }
                Err(e) => return Err(e.into()),
            },
            None => None,
        };

        let issued = self.tokens.issue(&user, role.as_ref())?;
        tracing::info!(user_id = %user.id, tenant_id = %user.tenant_id, "login succeeded");
        Ok(issued)
    }
}
