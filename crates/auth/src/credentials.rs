//! Credential hashing (bcrypt).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential hashing failed: {0}")]
    Hashing(String),
}

/// bcrypt hasher with a configurable work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordHasher {
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        bcrypt::hash(password, self.cost).map_err(|e| CredentialError::Hashing(e.to_string()))
    }

    /// Returns `false` for a mismatch and for a malformed stored hash alike.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_matches_only_the_original() {
        let hasher = PasswordHasher::with_cost(4); // bcrypt minimum cost (bcrypt::MIN_COST is private)
        let hash = hasher.hash("hunter2").unwrap();
        assert!(hasher.verify("hunter2", &hash));
        assert!(!hasher.verify("hunter3", &hash));
        assert!(!hasher.verify("hunter2", "not-a-bcrypt-hash"));
    }
}
