//! User aggregate for identity management (event-sourced).
//!
//! Users carry roles; assigning a role is guarded against privilege escalation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use billdesk_core::{typed_id, Aggregate, AggregateRoot, DomainError};
use billdesk_events::Event;

use crate::Role;

typed_id!(
    /// Unique identifier for a user.
    UserId
);

// ─────────────────────────────────────────────────────────────────────────────
// User Status
// ─────────────────────────────────────────────────────────────────────────────

/// User account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    /// User is active and can authenticate/transact.
    #[default]
    Active,
    /// User is suspended and cannot authenticate.
    Suspended,
}

impl core::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "Active"),
            UserStatus::Suspended => write!(f, "Suspended"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User Aggregate
// ─────────────────────────────────────────────────────────────────────────────

/// User aggregate for identity management.
///
/// # Invariants
/// - Email is lower-cased and contains `@`.
/// - Suspended users cannot be assigned new roles.
/// - Actors cannot grant roles they do not hold themselves (admins excepted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub roles: Vec<Role>,
    pub status: UserStatus,
    pub version: u64,
    pub created: bool,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: UserId::generate(),
            email: String::new(),
            display_name: String::new(),
            roles: Vec::new(),
            status: UserStatus::Active,
            version: 0,
            created: false,
        }
    }
}

impl User {
    pub fn empty(id: UserId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    fn ensure_existing(&self, user_id: UserId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != user_id {
            return Err(DomainError::invariant("user_id mismatch"));
        }
        Ok(())
    }

    fn ensure_not_suspended(&self) -> Result<(), DomainError> {
        if self.status == UserStatus::Suspended {
            return Err(DomainError::invariant("user is suspended"));
        }
        Ok(())
    }
}

impl AggregateRoot for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Command to create a new user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUser {
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
    pub initial_roles: Vec<Role>,
    pub occurred_at: DateTime<Utc>,
}

/// Command to assign a role to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignRole {
    pub user_id: UserId,
    pub role: Role,
    /// The roles of the actor performing this operation (for escalation check).
    pub actor_roles: Vec<Role>,
    pub occurred_at: DateTime<Utc>,
}

/// Command to revoke a role from a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeRole {
    pub user_id: UserId,
    pub role: Role,
    pub occurred_at: DateTime<Utc>,
}

/// Command to suspend a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendUser {
    pub user_id: UserId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command to activate a suspended user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateUser {
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// All user commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserCommand {
    Create(CreateUser),
    AssignRole(AssignRole),
    RevokeRole(RevokeRole),
    Suspend(SuspendUser),
    Activate(ActivateUser),
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Event emitted when a user is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreated {
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
    pub initial_roles: Vec<Role>,
    pub occurred_at: DateTime<Utc>,
}

/// Event emitted when a role is assigned to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssigned {
    pub user_id: UserId,
    pub role: Role,
    pub occurred_at: DateTime<Utc>,
}

/// Event emitted when a role is revoked from a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRevoked {
    pub user_id: UserId,
    pub role: Role,
    pub occurred_at: DateTime<Utc>,
}

/// Event emitted when a user is suspended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSuspended {
    pub user_id: UserId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event emitted when a user is activated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActivated {
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// All user events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserEvent {
    Created(UserCreated),
    RoleAssigned(RoleAssigned),
    RoleRevoked(RoleRevoked),
    Suspended(UserSuspended),
    Activated(UserActivated),
}

impl Event for UserEvent {
    fn event_type(&self) -> &'static str {
        match self {
            UserEvent::Created(_) => "auth.user.created",
            UserEvent::RoleAssigned(_) => "auth.user.role_assigned",
            UserEvent::RoleRevoked(_) => "auth.user.role_revoked",
            UserEvent::Suspended(_) => "auth.user.suspended",
            UserEvent::Activated(_) => "auth.user.activated",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            UserEvent::Created(e) => e.occurred_at,
            UserEvent::RoleAssigned(e) => e.occurred_at,
            UserEvent::RoleRevoked(e) => e.occurred_at,
            UserEvent::Suspended(e) => e.occurred_at,
            UserEvent::Activated(e) => e.occurred_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregate Implementation
// ─────────────────────────────────────────────────────────────────────────────

impl Aggregate for User {
    type Command = UserCommand;
    type Event = UserEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            UserEvent::Created(e) => self.apply_created(e),
            UserEvent::RoleAssigned(e) => self.apply_role_assigned(e),
            UserEvent::RoleRevoked(e) => self.apply_role_revoked(e),
            UserEvent::Suspended(e) => self.apply_suspended(e),
            UserEvent::Activated(e) => self.apply_activated(e),
        }
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            UserCommand::Create(cmd) => self.handle_create(cmd),
            UserCommand::AssignRole(cmd) => self.handle_assign_role(cmd),
            UserCommand::RevokeRole(cmd) => self.handle_revoke_role(cmd),
            UserCommand::Suspend(cmd) => self.handle_suspend(cmd),
            UserCommand::Activate(cmd) => self.handle_activate(cmd),
        }
    }
}

impl User {
    // ─────────────────────────────────────────────────────────────────────────
    // Command Handlers
    // ─────────────────────────────────────────────────────────────────────────

    fn handle_create(&self, cmd: &CreateUser) -> Result<Vec<UserEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("user already exists"));
        }

        let email = cmd.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(DomainError::field("email", "invalid email format"));
        }

        if cmd.display_name.trim().is_empty() {
            return Err(DomainError::field("displayName", "cannot be empty"));
        }

        let mut initial_roles = cmd.initial_roles.clone();
        initial_roles.sort();
        initial_roles.dedup();

        Ok(vec![UserEvent::Created(UserCreated {
            user_id: cmd.user_id,
            email,
            display_name: cmd.display_name.trim().to_string(),
            initial_roles,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_assign_role(&self, cmd: &AssignRole) -> Result<Vec<UserEvent>, DomainError> {
        self.ensure_existing(cmd.user_id)?;
        self.ensure_not_suspended()?;

        if self.has_role(&cmd.role) {
            return Err(DomainError::conflict("role already assigned"));
        }

        // Admins may grant anything; everyone else only roles they hold.
        let actor_has_admin = cmd.actor_roles.iter().any(Role::is_admin);
        let actor_has_role = cmd.actor_roles.contains(&cmd.role);

        if !actor_has_admin && !actor_has_role {
            return Err(DomainError::Unauthorized);
        }

        Ok(vec![UserEvent::RoleAssigned(RoleAssigned {
            user_id: cmd.user_id,
            role: cmd.role.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_revoke_role(&self, cmd: &RevokeRole) -> Result<Vec<UserEvent>, DomainError> {
        self.ensure_existing(cmd.user_id)?;

        if !self.has_role(&cmd.role) {
            return Err(DomainError::invariant("role not assigned"));
        }

        Ok(vec![UserEvent::RoleRevoked(RoleRevoked {
            user_id: cmd.user_id,
            role: cmd.role.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_suspend(&self, cmd: &SuspendUser) -> Result<Vec<UserEvent>, DomainError> {
        self.ensure_existing(cmd.user_id)?;

        if self.status == UserStatus::Suspended {
            return Err(DomainError::conflict("user already suspended"));
        }

        Ok(vec![UserEvent::Suspended(UserSuspended {
            user_id: cmd.user_id,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_activate(&self, cmd: &ActivateUser) -> Result<Vec<UserEvent>, DomainError> {
        self.ensure_existing(cmd.user_id)?;

        if self.status == UserStatus::Active {
            return Err(DomainError::conflict("user already active"));
        }

        Ok(vec![UserEvent::Activated(UserActivated {
            user_id: cmd.user_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event Appliers
    // ─────────────────────────────────────────────────────────────────────────

    fn apply_created(&mut self, e: &UserCreated) {
        self.id = e.user_id;
        self.email = e.email.clone();
        self.display_name = e.display_name.clone();
        self.roles = e.initial_roles.clone();
        self.status = UserStatus::Active;
        self.created = true;
    }

    fn apply_role_assigned(&mut self, e: &RoleAssigned) {
        self.roles.push(e.role.clone());
    }

    fn apply_role_revoked(&mut self, e: &RoleRevoked) {
        self.roles.retain(|r| r != &e.role);
    }

    fn apply_suspended(&mut self, _e: &UserSuspended) {
        self.status = UserStatus::Suspended;
    }

    fn apply_activated(&mut self, _e: &UserActivated) {
        self.status = UserStatus::Active;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
