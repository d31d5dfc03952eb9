use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use agrisync_core::UserId;

use crate::Role;

/// JWT claims model (transport-agnostic).
///
/// Timestamps travel as registered `iat` / `exp` claims in epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the authenticated user.
    pub sub: UserId,

    /// Role used to derive permissions.
    pub role: Role,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl JwtClaims {
    pub fn new(sub: UserId, role: Role, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub,
            role,
            issued_at,
            expires_at: issued_at + ttl,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate JWT claims.
///
/// Signature verification happens in [`crate::jwt`]; this checks the time
/// window only.
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
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn claims() -> JwtClaims {
        JwtClaims::new(UserId::new(1), Role::WORKER, at(1_000), Duration::seconds(600))
    }

    #[test]
    fn window_is_half_open() {
        let c = claims();
        assert_eq!(validate_claims(&c, at(999)), Err(TokenValidationError::NotYetValid));
        assert!(validate_claims(&c, at(1_000)).is_ok());
        assert!(validate_claims(&c, at(1_599)).is_ok());
        assert_eq!(validate_claims(&c, at(1_600)), Err(TokenValidationError::Expired));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let mut c = claims();
        c.expires_at = c.issued_at;
        assert_eq!(validate_claims(&c, at(1_000)), Err(TokenValidationError::InvalidTimeWindow));
    }

    #[test]
    fn serializes_registered_claim_names() {
        let v = serde_json::to_value(claims()).unwrap();
        assert_eq!(v["sub"], 1);
        assert_eq!(v["role"], "worker");
        assert_eq!(v["iat"], 1_000);
        assert_eq!(v["exp"], 1_600);
    }
}
