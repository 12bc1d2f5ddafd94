//! User records and the drafts/patches used to create and change them.
//!
//! A user belongs to exactly one tenant. The role, when present, must be a role
//! of that same tenant; a user without a role is a guest and holds no
//! permissions.

use serde::{Deserialize, Serialize};

use workstream_core::{validate, DomainResult, RoleId, TenantId, UserId};

use crate::credentials::{CredentialError, PasswordHasher};

/// Stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub credential_hash: String,
    pub tenant_id: TenantId,
    pub role_id: Option<RoleId>,
}

impl User {
    pub fn is_guest(&self) -> bool {
        self.role_id.is_none()
    }
}

/// Request to create a user inside the caller's tenant.
#[derive(Debug, Clone, Deserialize)]
pub struct UserDraft {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role_id: Option<RoleId>,
}

/// User ready to be inserted: validated, password already hashed.
///
/// The tenant is supplied separately by the storage call (from the caller's
/// scope, or from the tenant being provisioned).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub credential_hash: String,
    pub role_id: Option<RoleId>,
}

impl UserDraft {
    pub fn into_new_user(self, hasher: &PasswordHasher) -> Result<NewUser, UserInputError> {
        let username = validate_username(&self.username)?;
        let password = validate_password(&self.password)?;
        Ok(NewUser {
            username,
            credential_hash: hasher.hash(&password)?,
            role_id: self.role_id,
        })
    }
}

/// Partial update. Unset fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role_id: Option<RoleId>,
}

/// Validated patch with the password hashed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub credential_hash: Option<String>,
    pub role_id: Option<RoleId>,
}

impl UserPatch {
    pub fn into_changes(self, hasher: &PasswordHasher) -> Result<UserChanges, UserInputError> {
        let username = self.username.as_deref().map(validate_username).transpose()?;
        let credential_hash = match self.password.as_deref() {
            Some(p) => Some(hasher.hash(&validate_password(p)?)?),
            None => None,
        };
        Ok(UserChanges {
            username,
            credential_hash,
            role_id: self.role_id,
        })
    }
}

impl UserChanges {
    pub fn apply(&self, user: &mut User) {
        if let Some(username) = &self.username {
            user.username = username.clone();
        }
        if let Some(hash) = &self.credential_hash {
            user.credential_hash = hash.clone();
        }
        if let Some(role_id) = self.role_id {
            user.role_id = Some(role_id);
        }
    }
}

/// Initial owner account supplied at tenant provisioning.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerDraft {
    pub username: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UserInputError {
    #[error(transparent)]
    Invalid(#[from] workstream_core::DomainError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

pub fn validate_username(username: &str) -> DomainResult<String> {
    let username = validate::non_empty("username", username)?;
    if username.chars().any(char::is_whitespace) {
        return Err(workstream_core::DomainError::validation(
            "username must not contain whitespace",
        ));
    }
    Ok(username)
}

fn validate_password(password: &str) -> DomainResult<String> {
    if password.is_empty() {
        return Err(workstream_core::DomainError::validation("password must not be empty"));
    }
    Ok(password.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_cost(4) // bcrypt minimum cost (bcrypt::MIN_COST is private)
    }

    #[test]
    fn draft_hashes_password() {
        let draft = UserDraft {
            username: " bob ".into(),
            password: "s3cret".into(),
            role_id: None,
        };
        let new_user = draft.into_new_user(&hasher()).unwrap();
        assert_eq!(new_user.username, "bob");
        assert_ne!(new_user.credential_hash, "s3cret");
        assert!(hasher().verify("s3cret", &new_user.credential_hash));
    }

    #[test]
    fn draft_rejects_blank_fields() {
        let draft = UserDraft {
            username: "   ".into(),
            password: "x".into(),
            role_id: None,
        };
        assert!(draft.into_new_user(&hasher()).is_err());

        let draft = UserDraft {
            username: "bob".into(),
            password: String::new(),
            role_id: None,
        };
        assert!(draft.into_new_user(&hasher()).is_err());
    }

    #[test]
    fn patch_keeps_unset_fields() {
        let mut user = User {
            id: UserId::new(1),
            username: "bob".into(),
            credential_hash: "h".into(),
            tenant_id: TenantId::new(1),
            role_id: Some(RoleId::new(2)),
        };
        let changes = UserPatch {
            username: Some("robert".into()),
            ..Default::default()
        }
        .into_changes(&hasher())
        .unwrap();
        changes.apply(&mut user);
        assert_eq!(user.username, "robert");
        assert_eq!(user.credential_hash, "h");
        assert_eq!(user.role_id, Some(RoleId::new(2)));
    }

    #[test]
    fn credential_hash_is_never_serialized() {
        let user = User {
            id: UserId::new(1),
            username: "bob".into(),
            credential_hash: "secret-hash".into(),
            tenant_id: TenantId::new(1),
            role_id: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
