use serde::{Deserialize, Serialize};

use crate::user::{User, UserId, UserStatus};
use crate::{role_permissions, Permission, Role};

/// A fully resolved principal for authorization decisions.
///
/// Explicit `permissions` are granted on top of whatever the roles grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
    pub active: bool,
}

impl Principal {
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        Self {
            user_id,
            roles,
            permissions: Vec::new(),
            active: true,
        }
    }

    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            roles: user.roles.clone(),
            permissions: Vec::new(),
            active: user.status == UserStatus::Active,
        }
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    /// Role-derived and explicit permissions, sorted and deduplicated.
    pub fn effective_permissions(&self) -> Vec<Permission> {
        let mut perms: Vec<Permission> = self
            .roles
            .iter()
            .flat_map(role_permissions)
            .chain(self.permissions.iter().cloned())
            .collect();
        perms.sort();
        perms.dedup();
        perms
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(Role::is_admin)
    }
}
