use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role identifier used for RBAC.
///
/// Roles are opaque strings; [`role_permissions`] maps the built-in ones.
/// Unknown roles grant nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const ACCOUNTANT: Role = Role(Cow::Borrowed("accountant"));
    pub const SALES: Role = Role(Cow::Borrowed("sales"));
    pub const VIEWER: Role = Role(Cow::Borrowed("viewer"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.as_str() == "admin"
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Permissions granted by a built-in role.
pub fn role_permissions(role: &Role) -> Vec<Permission> {
    match role.as_str() {
        "admin" => vec![Permission::WILDCARD],
        "accountant" => vec![
            Permission::CUSTOMERS_READ,
            Permission::ORDERS_READ,
            Permission::PRICELIST_READ,
            Permission::INVOICES_READ,
            Permission::INVOICES_WRITE,
            Permission::INVOICES_STATUS,
            Permission::PLANS_READ,
            Permission::PLANS_WRITE,
            Permission::DASHBOARD_READ,
        ],
        "sales" => vec![
            Permission::CUSTOMERS_READ,
            Permission::CUSTOMERS_WRITE,
            Permission::ORDERS_READ,
            Permission::ORDERS_WRITE,
            Permission::PRICELIST_READ,
            Permission::INVOICES_READ,
            Permission::DASHBOARD_READ,
        ],
        "viewer" => vec![
            Permission::CUSTOMERS_READ,
            Permission::ORDERS_READ,
            Permission::PRICELIST_READ,
            Permission::INVOICES_READ,
            Permission::PLANS_READ,
            Permission::DASHBOARD_READ,
        ],
        _ => Vec::new(),
    }
}

/// Role definition with its granted permissions (for display).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDefinition {
    pub name: Role,
    pub description: String,
    pub permissions: Vec<Permission>,
}

/// Catalogue of the built-in roles.
pub fn builtin_roles() -> Vec<RoleDefinition> {
    [
        (Role::ADMIN, "Full access, including user management"),
        (Role::ACCOUNTANT, "Invoices, payments status and recurring plans"),
        (Role::SALES, "Customers and orders"),
        (Role::VIEWER, "Read-only access"),
    ]
    .into_iter()
    .map(|(name, description)| RoleDefinition {
        permissions: role_permissions(&name),
        name,
        description: description.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_is_wildcard() {
        assert_eq!(role_permissions(&Role::ADMIN), vec![Permission::WILDCARD]);
        assert!(Role::new("admin").is_admin());
    }

    #[test]
    fn unknown_role_grants_nothing() {
        assert!(role_permissions(&Role::new("intern")).is_empty());
    }

    #[test]
    fn viewer_cannot_write() {
        assert!(role_permissions(&Role::VIEWER)
            .iter()
            .all(|p| p.as_str().ends_with(".read")));
    }

    #[test]
    fn catalogue_lists_builtin_roles() {
        let roles = builtin_roles();
        assert_eq!(roles.len(), 4);
        let json = serde_json::to_value(&roles[1]).unwrap();
        assert_eq!(json["name"], "accountant");
        assert!(json["permissions"].as_array().unwrap().len() > 1);
    }
}
