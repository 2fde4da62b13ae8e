use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use assetdesk_core::UserId;

use crate::Role;

/// JWT claims model (transport-agnostic).
///
/// This is the minimal set of claims AssetDesk expects once a token has been
/// decoded/verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the username, recorded as the actor in audit entries.
    pub sub: String,

    /// Stable user identifier, when the account has one.
    #[serde(default)]
    pub user_id: Option<UserId>,

    /// Single RBAC role (`admin` or `user`).
    pub role: Role,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

impl JwtClaims {
    pub fn new(
        sub: impl Into<String>,
        user_id: Option<UserId>,
        role: Role,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: sub.into(),
            user_id,
            role,
            issued_at: now,
            expires_at: now + ttl,
        }
    }
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

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only. Signature verification lives in
/// [`crate::jwt`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_checks() {
        let now = Utc::now();
        let claims = JwtClaims::new("admin", None, Role::admin(), now, Duration::hours(8));
        assert_eq!(validate_claims(&claims, now), Ok(()));
        assert_eq!(
            validate_claims(&claims, now + Duration::hours(8)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&claims, now - Duration::seconds(1)),
            Err(TokenValidationError::NotYetValid)
        );

        let broken = JwtClaims::new("admin", None, Role::admin(), now, Duration::zero());
        assert_eq!(validate_claims(&broken, now), Err(TokenValidationError::InvalidTimeWindow));
    }
}
