//! Collaborator interfaces for the policy engine.
//!
//! The resolver only consumes an in-memory candidate list. These traits
//! describe where that list and the membership facts come from, with
//! in-memory implementations for embedded use and tests.

mod memory;
mod traits;

pub use memory::{InMemoryDirectory, InMemoryPolicyStore};
pub use traits::{Directory, PolicyStore, StorageError};
