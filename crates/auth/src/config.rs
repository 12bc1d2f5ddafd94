//! Token signing configuration.

use chrono::Duration;

/// Lifetime of every session token.
pub const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Configuration for [`crate::TokenService`].
///
/// The secret is shared out of band between issuers and validators; tokens are
/// signed with HMAC-SHA-256 over it.
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: Vec<u8>,
    pub issuer: String,
    pub audience: String,
    pub lifetime: Duration,
    /// Clock skew tolerated when checking `iat`/`exp`, in seconds.
    pub leeway_secs: i64,
}

impl TokenConfig {
    pub fn new(secret: impl Into<Vec<u8>>, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            lifetime: Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS),
            leeway_secs: 0,
        }
    }

    pub fn with_leeway_secs(mut self, leeway_secs: i64) -> Self {
        self.leeway_secs = leeway_secs.max(0);
        self
    }
}

impl core::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("lifetime", &self.lifetime)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}
