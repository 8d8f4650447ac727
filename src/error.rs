//! Error types for spendpolicy.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! specific conditions. The resolver and limit checker themselves are total;
//! errors only arise from input construction and from the collaborators
//! wired into the [`PolicyEngine`](crate::engine::PolicyEngine).

use rust_decimal::Decimal;
use thiserror::Error;

use crate::identity::{CategoryId, OrgId, UserId};
use crate::storage::StorageError;

/// Validation errors that occur while constructing inputs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{kind} identifier cannot be empty")]
    EmptyIdentifier {
        kind: &'static str,
    },

    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Amount {amount} is negative; policy limits must be non-negative")]
    NegativeAmount {
        amount: Decimal,
    },

    #[error("Invalid engine configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Execution errors raised by the engine before resolution runs.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("User {user} is not a member of organization {org}")]
    NotAMember {
        org: OrgId,
        user: UserId,
    },

    #[error("Category {category} does not belong to organization {org}")]
    CategoryNotFound {
        org: OrgId,
        category: CategoryId,
    },

    #[error("Too many candidate policies (max: {max}, actual: {actual})")]
    TooManyCandidates {
        max: usize,
        actual: usize,
    },
}

/// Top-level error type for spendpolicy.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl PolicyError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            // Bad input and membership failures won't change on retry
            Self::Validation(_) | Self::Execution(_) => false,
            Self::Storage(e) => matches!(e, StorageError::BackendError(_)),
        }
    }
}

/// Result type alias for spendpolicy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
