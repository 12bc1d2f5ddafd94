use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use workstream_core::{RoleId, TenantId, UserId};

/// Wire value of the `RoleId` claim for a user without a role.
///
/// Kept distinct from any numeric id (including `0`).
pub const NO_ROLE: &str = "none";

/// Session token claims as they appear on the wire.
///
/// Tenant and role ids are stringified integers. They are optional at the
/// serde level so that a token lacking them still decodes and the accessor
/// reports the precise reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Username of the bearer.
    pub sub: String,

    /// User id of the bearer (stringified integer).
    #[serde(rename = "nameidentifier")]
    pub user_id: String,

    /// Role name, or `"Guest"` when the user has no role.
    pub role: String,

    #[serde(rename = "TenantId", default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    #[serde(rename = "RoleId", default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,

    pub iss: String,
    pub aud: String,

    /// Issued-at (unix seconds).
    pub iat: i64,

    /// Expiration (unix seconds).
    pub exp: i64,

    /// Unique token id.
    pub jti: String,
}

/// Why a claim could not be read. Logged, never surfaced to callers.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ClaimError {
    #[error("claim '{0}' is missing")]
    Missing(&'static str),

    #[error("claim '{0}' is malformed")]
    Malformed(&'static str),
}

impl SessionClaims {
    pub fn tenant_id(&self) -> Result<TenantId, ClaimError> {
        let raw = self.tenant_id.as_deref().ok_or(ClaimError::Missing("TenantId"))?;
        raw.parse().map_err(|_| ClaimError::Malformed("TenantId"))
    }

    /// `Ok(None)` is the explicit no-role encoding; an absent claim is an error.
    pub fn role_id(&self) -> Result<Option<RoleId>, ClaimError> {
        let raw = self.role_id.as_deref().ok_or(ClaimError::Missing("RoleId"))?;
        decode_role_id(raw)
    }

    pub fn user_id(&self) -> Result<UserId, ClaimError> {
        self.user_id.parse().map_err(|_| ClaimError::Malformed("nameidentifier"))
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

pub fn encode_role_id(role_id: Option<RoleId>) -> String {
    match role_id {
        Some(id) => id.to_string(),
        None => NO_ROLE.to_string(),
    }
}

pub fn decode_role_id(raw: &str) -> Result<Option<RoleId>, ClaimError> {
    if raw == NO_ROLE {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| ClaimError::Malformed("RoleId"))
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate the token lifetime against `now`.
///
/// Expiry is always enforced; there is no decode path that skips it.
pub fn validate_claims(
    claims: &SessionClaims,
    now: DateTime<Utc>,
    leeway_secs: i64,
) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now + leeway_secs < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now - leeway_secs >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims_at(now: DateTime<Utc>) -> SessionClaims {
        SessionClaims {
            sub: "alice".into(),
            user_id: "11".into(),
            role: "Owner".into(),
            tenant_id: Some("7".into()),
            role_id: Some("3".into()),
            iss: "workstream".into(),
            aud: "workstream-api".into(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(24)).timestamp(),
            jti: "j".into(),
        }
    }

    #[test]
    fn window_is_enforced() {
        let now = Utc::now();
        let claims = claims_at(now);
        assert_eq!(validate_claims(&claims, now, 0), Ok(()));
        assert_eq!(
            validate_claims(&claims, now + Duration::hours(24), 0),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&claims, now - Duration::minutes(5), 0),
            Err(TokenValidationError::NotYetValid)
        );
        assert_eq!(validate_claims(&claims, now - Duration::minutes(5), 600), Ok(()));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = Utc::now();
        let mut claims = claims_at(now);
        claims.exp = claims.iat;
        assert_eq!(
            validate_claims(&claims, now, 0),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn role_sentinel_differs_from_zero() {
        assert_eq!(decode_role_id(NO_ROLE), Ok(None));
        assert_eq!(decode_role_id("0"), Err(ClaimError::Malformed("RoleId")));
        assert_eq!(decode_role_id("3"), Ok(Some(RoleId::new(3))));
        assert_eq!(encode_role_id(None), NO_ROLE);
    }

    #[test]
    fn accessors_report_missing_and_malformed() {
        let mut claims = claims_at(Utc::now());
        assert_eq!(claims.tenant_id(), Ok(TenantId::new(7)));

        claims.tenant_id = Some("seven".into());
        assert_eq!(claims.tenant_id(), Err(ClaimError::Malformed("TenantId")));

        claims.tenant_id = None;
        claims.role_id = None;
        assert_eq!(claims.tenant_id(), Err(ClaimError::Missing("TenantId")));
        assert_eq!(claims.role_id(), Err(ClaimError::Missing("RoleId")));
    }

    #[test]
    fn wire_names_match_contract() {
        let claims = claims_at(Utc::now());
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["nameidentifier"], "11");
        assert_eq!(json["TenantId"], "7");
        assert_eq!(json["RoleId"], "3");
        assert_eq!(json["role"], "Owner");
    }
}
