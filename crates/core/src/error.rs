//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Deterministic business failures only (validation, invariants, conflicts).
/// Transport and backend failures live in the client crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. negative quantity on an invoice line).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated (e.g. editing a paid invoice).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The aggregate has not been created yet.
    #[error("not found")]
    NotFound,

    /// The command conflicts with current state (duplicate create, no-op change).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The acting principal may not perform the operation.
    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Validation failure attributed to a named input field.
    pub fn field(field: &str, msg: impl core::fmt::Display) -> Self {
        Self::Validation(format!("{field}: {msg}"))
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_name_the_field() {
        let err = DomainError::field("items[2].quantity", "must not be negative");
        assert_eq!(
            err.to_string(),
            "validation failed: items[2].quantity: must not be negative"
        );
    }
}
