use serde::Serialize;
use thiserror::Error;

use crate::{Permission, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("account is suspended")]
    Suspended,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a principal for one permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if !principal.active {
        return Err(AuthzError::Suspended);
    }

    let granted = principal
        .effective_permissions()
        .iter()
        .any(|p| p.is_wildcard() || p == required);

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Why a request was allowed or denied, for display in the users screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationExplanation {
    pub required_permission: String,
    pub granted: bool,
    pub reason: String,
    pub roles: Vec<String>,
    pub effective_permissions: Vec<String>,
    /// Built-in roles that would grant the permission, when denied.
    pub suggested_roles: Vec<String>,
}

pub fn explain_authorization(principal: &Principal, required: &Permission) -> AuthorizationExplanation {
    let effective = principal.effective_permissions();
    let has_wildcard = effective.iter().any(Permission::is_wildcard);
    let has_required = effective.iter().any(|p| p == required);

    let (granted, reason) = if !principal.active {
        (false, "Account is suspended".to_string())
    } else if has_wildcard {
        (true, "Principal has wildcard permission '*' (granted by admin role)".to_string())
    } else if has_required {
        (true, format!("Principal has permission '{required}'"))
    } else {
        (false, format!("Principal does not have permission '{required}'"))
    };

    let suggested_roles = if granted || !principal.active {
        Vec::new()
    } else {
        crate::builtin_roles()
            .into_iter()
            .filter(|def| {
                !def.name.is_admin() && def.permissions.iter().any(|p| p == required)
            })
            .map(|def| def.name.to_string())
            .collect()
    };

    AuthorizationExplanation {
        required_permission: required.to_string(),
        granted,
        reason,
        roles: principal.roles.iter().map(ToString::to_string).collect(),
        effective_permissions: effective.iter().map(ToString::to_string).collect(),
        suggested_roles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Role, UserId};

    #[test]
    fn admin_wildcard_grants_everything() {
        let principal = Principal::new(UserId::generate(), vec![Role::ADMIN]);
        assert!(authorize(&principal, &Permission::USERS_WRITE).is_ok());
        assert!(authorize(&principal, &Permission::new("anything.at_all")).is_ok());
    }

    #[test]
    fn role_permissions_are_applied() {
        let principal = Principal::new(UserId::generate(), vec![Role::SALES]);
        assert!(authorize(&principal, &Permission::ORDERS_WRITE).is_ok());
        assert_eq!(
            authorize(&principal, &Permission::INVOICES_STATUS),
            Err(AuthzError::Forbidden("invoices.status".to_string()))
        );
    }

    #[test]
    fn explicit_permission_is_added_to_roles() {
        let principal = Principal::new(UserId::generate(), vec![Role::VIEWER])
            .with_permission(Permission::INVOICES_STATUS);
        assert!(authorize(&principal, &Permission::INVOICES_STATUS).is_ok());
        assert!(authorize(&principal, &Permission::INVOICES_WRITE).is_err());
    }

    #[test]
    fn suspended_principal_is_rejected() {
        let mut principal = Principal::new(UserId::generate(), vec![Role::ADMIN]);
        principal.active = false;
        assert_eq!(authorize(&principal, &Permission::DASHBOARD_READ), Err(AuthzError::Suspended));
    }

    #[test]
    fn explanation_suggests_roles() {
        let principal = Principal::new(UserId::generate(), vec![Role::VIEWER]);
        let explanation = explain_authorization(&principal, &Permission::INVOICES_STATUS);
        assert!(!explanation.granted);
        assert_eq!(explanation.suggested_roles, vec!["accountant".to_string()]);

        let explanation = explain_authorization(&principal, &Permission::INVOICES_READ);
        assert!(explanation.granted);
        assert!(explanation.suggested_roles.is_empty());
    }
}
