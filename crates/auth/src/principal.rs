use serde::Serialize;

use agrisync_core::UserId;

use crate::{Permission, Role};

/// A fully resolved caller for authorization decisions.
///
/// Built by the API layer from verified claims plus the role policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
