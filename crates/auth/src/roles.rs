use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use agrisync_core::{DomainError, DomainResult};

/// Role identifier used for RBAC.
///
/// Tokens may carry any role string; only [`Role::ADMIN`] and
/// [`Role::WORKER`] can be assigned to stored users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const WORKER: Role = Role(Cow::Borrowed("worker"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        *self == Self::ADMIN
    }

    /// Parse a role that may be stored on a user record.
    pub fn assignable(name: &str) -> DomainResult<Self> {
        match name.trim() {
            "admin" => Ok(Self::ADMIN),
            "worker" => Ok(Self::WORKER),
            other => Err(DomainError::validation(format!(
                "role: \"{other}\" is not a valid choice (expected one of: admin, worker)"
            ))),
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::WORKER
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
