//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("No agents available to form a council")]
    EmptyCouncil,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }

    /// Check if this error is a caller-side validation failure
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::EmptyCouncil
                | DomainError::InvalidQuery(_)
                | DomainError::InvalidPlan(_)
                | DomainError::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::EmptyCouncil.is_cancelled());
        assert!(!DomainError::InvalidPlan("no tasks".to_string()).is_cancelled());
    }

    #[test]
    fn test_validation_classification() {
        assert!(DomainError::EmptyCouncil.is_validation());
        assert!(DomainError::InvalidPlan("x".to_string()).is_validation());
        assert!(!DomainError::Cancelled.is_validation());
    }
}
