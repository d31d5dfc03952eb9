//! `agrisync-auth`: authentication and authorization boundary.
//!
//! Decoupled from HTTP and storage. The API layer derives a [`Principal`]
//! from a verified token and checks permissions with [`authorize`].

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::Role;
pub use user::{NewUser, User};
