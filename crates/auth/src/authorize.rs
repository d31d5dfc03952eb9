use thiserror::Error;

use crate::{Permission, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Check that `principal` holds `required` (directly or via the wildcard).
///
/// - No IO
/// - No panics
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let granted = principal
        .permissions
        .iter()
        .any(|p| p.is_wildcard() || p == required);

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use agrisync_core::UserId;

    fn principal(perms: &[&'static str]) -> Principal {
        Principal {
            user_id: UserId::new(1),
            role: Role::WORKER,
            permissions: perms.iter().map(|p| Permission::from_static(p)).collect(),
        }
    }

    #[test]
    fn wildcard_grants_everything() {
        assert!(authorize(&principal(&["*"]), &Permission::new("fields.write")).is_ok());
    }

    #[test]
    fn explicit_permission_is_required() {
        let p = principal(&["fields.read"]);
        assert!(authorize(&p, &Permission::new("fields.read")).is_ok());
        assert_eq!(
            authorize(&p, &Permission::new("fields.write")),
            Err(AuthzError::Forbidden("fields.write".to_string()))
        );
    }

    #[test]
    fn no_permissions_denies() {
        assert!(authorize(&principal(&[]), &Permission::new("crops.read")).is_err());
    }
}
