//! `billdesk-auth` — users, roles and permission checks.
//!
//! Decoupled from HTTP and storage: the client and any future server decide
//! where principals come from, this crate decides what they may do.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{authorize, explain_authorization, AuthorizationExplanation, AuthzError};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::{builtin_roles, role_permissions, Role, RoleDefinition};
pub use user::{
    ActivateUser, AssignRole, CreateUser, RevokeRole, RoleAssigned, RoleRevoked, SuspendUser,
    User, UserActivated, UserCommand, UserCreated, UserEvent, UserId, UserStatus, UserSuspended,
};
