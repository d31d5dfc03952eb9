//! API-side authorization guard.
//!
//! Handlers call [`require`] before touching storage. Domain crates and
//! infra stay auth-agnostic.

use agrisync_auth::{AuthzError, Permission, Principal, Role, authorize};

use crate::context::PrincipalContext;

/// Permission names checked by the routes.
pub mod perms {
    use agrisync_auth::Permission;

    pub const FIELDS_READ: Permission = Permission::from_static("fields.read");
    pub const FIELDS_WRITE: Permission = Permission::from_static("fields.write");
    pub const CROPS_READ: Permission = Permission::from_static("crops.read");
    pub const CROPS_WRITE: Permission = Permission::from_static("crops.write");
    pub const CROPS_INPUTS_RECORD: Permission = Permission::from_static("crops.inputs.record");
    pub const INVENTORY_READ: Permission = Permission::from_static("inventory.read");
    pub const INVENTORY_WRITE: Permission = Permission::from_static("inventory.write");
    pub const TASKS_READ: Permission = Permission::from_static("tasks.read");
    pub const TASKS_WRITE: Permission = Permission::from_static("tasks.write");
    pub const TASKS_STATUS_UPDATE: Permission = Permission::from_static("tasks.status.update");
    pub const USERS_READ: Permission = Permission::from_static("users.read");
    pub const USERS_WRITE: Permission = Permission::from_static("users.write");
}

/// Role→permission policy.
///
/// "admin" grants everything; "worker" can read and record field work;
/// any other role grants nothing.
pub fn permissions_for_role(role: &Role) -> Vec<Permission> {
    if role.is_admin() {
        return vec![Permission::WILDCARD];
    }

    if *role == Role::WORKER {
        return vec![
            perms::FIELDS_READ,
            perms::CROPS_READ,
            perms::INVENTORY_READ,
            perms::TASKS_READ,
            perms::CROPS_INPUTS_RECORD,
            perms::TASKS_STATUS_UPDATE,
        ];
    }

    Vec::new()
}

pub fn principal(ctx: &PrincipalContext) -> Principal {
    Principal {
        user_id: ctx.user_id(),
        role: ctx.role().clone(),
        permissions: permissions_for_role(ctx.role()),
    }
}

/// Check a single permission for the current request.
pub fn require(ctx: &PrincipalContext, required: &Permission) -> Result<(), AuthzError> {
    authorize(&principal(ctx), required)
}
