//! HS256 bearer-token verification and issuance.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::{JwtClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("malformed or unsigned token: {0}")]
    Decode(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Verifies bearer tokens and yields their claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError>;
}

/// Shared-secret HS256 validator.
///
/// The library's own `exp` check is disabled; time checks go through
/// [`validate_claims`] against the caller-supplied `now`.
pub struct Hs256JwtValidator {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            decoding: DecodingKey::from_secret(secret),
            encoding: EncodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign `claims` with the shared secret.
    pub fn issue(&self, claims: &JwtClaims) -> Result<String, JwtError> {
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.encoding,
        )?)
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use agrisync_core::UserId;
    use chrono::Duration;

    #[test]
    fn issued_token_validates() {
        let v = Hs256JwtValidator::new("s3cret");
        let now = Utc::now();
        let claims = JwtClaims::new(UserId::new(42), Role::ADMIN, now, Duration::minutes(5));
        let token = v.issue(&claims).unwrap();

        let decoded = v.validate(&token, now).unwrap();
        assert_eq!(decoded.sub, UserId::new(42));
        assert_eq!(decoded.role, Role::ADMIN);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = Utc::now();
        let claims = JwtClaims::new(UserId::new(1), Role::WORKER, now, Duration::minutes(5));
        let token = Hs256JwtValidator::new("a").issue(&claims).unwrap();
        assert!(matches!(
            Hs256JwtValidator::new("b").validate(&token, now),
            Err(JwtError::Decode(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let v = Hs256JwtValidator::new("s3cret");
        let issued = Utc::now() - Duration::hours(2);
        let claims = JwtClaims::new(UserId::new(1), Role::WORKER, issued, Duration::minutes(5));
        let token = v.issue(&claims).unwrap();
        assert!(matches!(
            v.validate(&token, Utc::now()),
            Err(JwtError::Claims(TokenValidationError::Expired))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        let v = Hs256JwtValidator::new("s3cret");
        assert!(v.validate("not-a-jwt", Utc::now()).is_err());
    }
}
