//! Session token issuance and validation (HS256).

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use uuid::Uuid;

use workstream_core::{RoleId, TenantId};

use crate::claims::{encode_role_id, validate_claims, SessionClaims};
use crate::config::TokenConfig;
use crate::error::{AuthError, TokenError};
use crate::principal::{Session, TenantScope};
use crate::roles::{Role, GUEST};
use crate::user::User;

/// A freshly signed token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates session tokens.
///
/// Every decode path checks signature, issuer, audience and lifetime.
pub struct TokenService {
    config: TokenConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService").field("config", &self.config).finish()
    }
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        // Lifetime is checked by `validate_claims` against an injectable clock.
        validation.validate_exp = false;

        Self {
            encoding: EncodingKey::from_secret(&config.secret),
            decoding: DecodingKey::from_secret(&config.secret),
            validation,
            config,
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn issue(&self, user: &User, role: Option<&Role>) -> Result<IssuedToken, TokenError> {
        self.issue_at(user, role, Utc::now())
    }

    /// Sign a token for `user`. `role` must be the user's own role, or `None`
    /// for a guest.
    pub fn issue_at(
        &self,
        user: &User,
        role: Option<&Role>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let role_name = match (user.role_id, role) {
            (None, None) => GUEST.to_string(),
            (Some(id), Some(role)) if role.id == id && role.tenant_id == user.tenant_id => {
                role.name.clone()
            }
            _ => return Err(TokenError::RoleMismatch),
        };

        let expires_at = now + self.config.lifetime;
        let claims = SessionClaims {
            sub: user.username.clone(),
            user_id: user.id.to_string(),
            role: role_name,
            tenant_id: Some(user.tenant_id.to_string()),
            role_id: Some(encode_role_id(user.role_id)),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::now_v7().to_string(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        tracing::debug!(
            user_id = %user.id,
            tenant_id = %user.tenant_id,
            role_id = ?user.role_id,
            "issued session token"
        );

        Ok(IssuedToken { token, expires_at })
    }

    pub fn decode(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.decode_at(token, Utc::now())
    }

    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, AuthError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AuthError::Authentication
            })?;

        validate_claims(&data.claims, now, self.config.leeway_secs).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AuthError::Authentication
        })?;

        Ok(data.claims)
    }

    pub fn tenant_id(&self, token: &str) -> Result<TenantId, AuthError> {
        self.decode(token)?.tenant_id().map_err(|e| {
            tracing::warn!(error = %e, "token rejected");
            AuthError::Authentication
        })
    }

    /// `Ok(None)` means the bearer has no role.
    pub fn role_id(&self, token: &str) -> Result<Option<RoleId>, AuthError> {
        self.decode(token)?.role_id().map_err(|e| {
            tracing::warn!(error = %e, "token rejected");
            AuthError::Authentication
        })
    }

    pub fn authenticate(&self, token: &str) -> Result<Session, AuthError> {
        self.authenticate_at(token, Utc::now())
    }

    /// Decode once and turn the claims into a [`Session`].
    pub fn authenticate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Session, AuthError> {
        let claims = self.decode_at(token, now)?;

        let reject = |e: crate::claims::ClaimError| {
            tracing::warn!(error = %e, "token rejected");
            AuthError::Authentication
        };
        let tenant_id = claims.tenant_id().map_err(reject)?;
        let role_id = claims.role_id().map_err(reject)?;
        let user_id = claims.user_id().map_err(reject)?;
        let expires_at = claims.expires_at().ok_or(AuthError::Authentication)?;

        Ok(Session {
            user_id,
            username: claims.sub,
            role_name: claims.role,
            role_id,
            scope: TenantScope::new(tenant_id),
            expires_at,
        })
    }
}

/// Strip the `Bearer ` prefix from an `Authorization` header value.
pub fn extract_bearer(header: &str) -> Result<&str, AuthError> {
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::Authentication)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::Authentication);
    }
    Ok(token)
}
