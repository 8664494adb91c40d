//! Domain error model.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic business failure raised by domain code.
///
/// Storage, transport and serialization problems are modelled in the layers that
/// own them; this enum only describes why the workshop rules rejected something.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input did not pass validation (missing name, bad quantity, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The referenced record does not exist in the caller's branch.
    #[error("{0} not found")]
    NotFound(String),

    /// Concurrent modification or duplicate creation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The record's lifecycle does not allow the operation (e.g. editing a completed order).
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Message suitable for a user-facing flash or JSON `error` field.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg)
            | Self::InvalidId(msg)
            | Self::Conflict(msg)
            | Self::InvalidState(msg) => msg.clone(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Unauthorized => "unauthorized".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_strips_the_category_prefix() {
        let err = DomainError::validation("Customer name and phone are required");
        assert_eq!(err.user_message(), "Customer name and phone are required");
        assert_eq!(
            err.to_string(),
            "validation failed: Customer name and phone are required"
        );
        assert_eq!(DomainError::not_found("order").user_message(), "order not found");
    }
}
