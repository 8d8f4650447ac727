//! Abstract storage traits.
//!
//! These traits define the contract that policy and membership backends must
//! implement. By using traits, the engine runs unchanged against:
//! - In-memory backends for testing and embedded use
//! - Database-backed stores owned by the surrounding application

use thiserror::Error;

use crate::identity::{CategoryId, OrgId, PolicyId, UserId};
use crate::policy::{Policy, PolicyDetails};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Policy not found.
    #[error("Policy not found: {0}")]
    PolicyNotFound(PolicyId),

    /// Key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// An update tried to move a policy to another organization.
    #[error("Cannot move policy {id} from organization {from} to {to}")]
    OrgMismatch {
        id: PolicyId,
        from: OrgId,
        to: OrgId,
    },

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Storage trait for policy records.
///
/// # Safety Considerations
/// - All mutations should be atomic where possible
/// - `list_for_org` should return a consistent snapshot; resolution breaks
///   same-class ties by the order it returns
pub trait PolicyStore<P = PolicyDetails>: Send + Sync {
    /// Insert a new policy. Returns error if the ID already exists.
    fn insert(&self, policy: Policy<P>) -> Result<(), StorageError>;

    /// Get a policy by ID.
    fn get(&self, id: &PolicyId) -> Result<Option<Policy<P>>, StorageError>;

    /// Replace an existing policy. Returns error if not found or if the
    /// owning organization would change.
    fn update(&self, policy: Policy<P>) -> Result<(), StorageError>;

    /// Delete a policy by ID. Returns error if not found.
    fn delete(&self, id: &PolicyId) -> Result<(), StorageError>;

    /// All policies belonging to `org_id`, in insertion order.
    fn list_for_org(&self, org_id: &OrgId) -> Result<Vec<Policy<P>>, StorageError>;
}

/// Membership facts the engine checks before resolving.
pub trait Directory: Send + Sync {
    /// Returns true if `user_id` is a member of `org_id`.
    fn is_member(&self, org_id: &OrgId, user_id: &UserId) -> Result<bool, StorageError>;

    /// Returns true if `category_id` belongs to `org_id`.
    fn category_in_org(&self, org_id: &OrgId, category_id: &CategoryId) -> Result<bool, StorageError>;
}
