use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Opaque `resource.action` strings (e.g. "invoices.write"). The wildcard
/// `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    pub const CUSTOMERS_READ: Permission = Permission(Cow::Borrowed("customers.read"));
    pub const CUSTOMERS_WRITE: Permission = Permission(Cow::Borrowed("customers.write"));
    pub const ORDERS_READ: Permission = Permission(Cow::Borrowed("orders.read"));
    pub const ORDERS_WRITE: Permission = Permission(Cow::Borrowed("orders.write"));
    pub const PRICELIST_READ: Permission = Permission(Cow::Borrowed("pricelist.read"));
    pub const PRICELIST_WRITE: Permission = Permission(Cow::Borrowed("pricelist.write"));
    pub const INVOICES_READ: Permission = Permission(Cow::Borrowed("invoices.read"));
    pub const INVOICES_WRITE: Permission = Permission(Cow::Borrowed("invoices.write"));
    pub const INVOICES_STATUS: Permission = Permission(Cow::Borrowed("invoices.status"));
    pub const PLANS_READ: Permission = Permission(Cow::Borrowed("plans.read"));
    pub const PLANS_WRITE: Permission = Permission(Cow::Borrowed("plans.write"));
    pub const USERS_READ: Permission = Permission(Cow::Borrowed("users.read"));
    pub const USERS_WRITE: Permission = Permission(Cow::Borrowed("users.write"));
    pub const DASHBOARD_READ: Permission = Permission(Cow::Borrowed("dashboard.read"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }

    /// Resource part of `resource.action`.
    pub fn resource(&self) -> &str {
        self.as_str().split('.').next().unwrap_or_default()
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_and_resource() {
        assert!(Permission::WILDCARD.is_wildcard());
        assert!(!Permission::new("invoices.read").is_wildcard());
        assert_eq!(Permission::INVOICES_STATUS.resource(), "invoices");
        assert_eq!(Permission::new("invoices.read"), Permission::INVOICES_READ);
    }
}
