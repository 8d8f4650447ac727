//! In-memory storage backend.
//!
//! Thread-safe implementations of the storage traits, intended for embedded
//! usage, tests, and as a reference implementation.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::identity::{CategoryId, OrgId, PolicyId, UserId};
use crate::policy::{Policy, PolicyDetails};
use crate::storage::traits::{Directory, PolicyStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

#[derive(Debug)]
struct PolicyState<P> {
    by_id: HashMap<PolicyId, Policy<P>>,
    // Insertion order per organization.
    by_org: HashMap<OrgId, Vec<PolicyId>>,
}

impl<P> Default for PolicyState<P> {
    fn default() -> Self {
        Self {
            by_id: HashMap::new(),
            by_org: HashMap::new(),
        }
    }
}

/// Thread-safe in-memory policy store.
#[derive(Debug)]
pub struct InMemoryPolicyStore<P = PolicyDetails> {
    state: RwLock<PolicyState<P>>,
}

impl<P> Default for InMemoryPolicyStore<P> {
    fn default() -> Self {
        Self {
            state: RwLock::new(PolicyState::default()),
        }
    }
}

impl<P> InMemoryPolicyStore<P> {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored policies across all organizations.
    pub fn len(&self) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("policy.len"))?;
        Ok(state.by_id.len())
    }

    /// Returns true if no policies are stored.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl<P: Clone + Send + Sync> PolicyStore<P> for InMemoryPolicyStore<P> {
    fn insert(&self, policy: Policy<P>) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("policy.insert"))?;
        if state.by_id.contains_key(&policy.id) {
            return Err(StorageError::DuplicateKey(policy.id.to_string()));
        }

        state
            .by_org
            .entry(policy.org_id.clone())
            .or_default()
            .push(policy.id.clone());
        state.by_id.insert(policy.id.clone(), policy);
        Ok(())
    }

    fn get(&self, id: &PolicyId) -> Result<Option<Policy<P>>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("policy.get"))?;
        Ok(state.by_id.get(id).cloned())
    }

    fn update(&self, policy: Policy<P>) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("policy.update"))?;
        let prev = state
            .by_id
            .get(&policy.id)
            .ok_or_else(|| StorageError::PolicyNotFound(policy.id.clone()))?;

        if prev.org_id != policy.org_id {
            return Err(StorageError::OrgMismatch {
                id: policy.id.clone(),
                from: prev.org_id.clone(),
                to: policy.org_id.clone(),
            });
        }

        // Keeps its original position in the org's insertion order.
        state.by_id.insert(policy.id.clone(), policy);
        Ok(())
    }

    fn delete(&self, id: &PolicyId) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("policy.delete"))?;
        let removed = state
            .by_id
            .remove(id)
            .ok_or_else(|| StorageError::PolicyNotFound(id.clone()))?;

        let now_empty = match state.by_org.get_mut(&removed.org_id) {
            Some(ids) => {
                ids.retain(|existing| existing != id);
                ids.is_empty()
            }
            None => false,
        };
        if now_empty {
            state.by_org.remove(&removed.org_id);
        }
        Ok(())
    }

    fn list_for_org(&self, org_id: &OrgId) -> Result<Vec<Policy<P>>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("policy.list_for_org"))?;
        let Some(ids) = state.by_org.get(org_id) else {
            return Ok(Vec::new());
        };

        ids.iter()
            .map(|id| {
                state.by_id.get(id).cloned().ok_or_else(|| {
                    StorageError::BackendError(format!("org index references missing policy {id}"))
                })
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    members: HashMap<OrgId, HashSet<UserId>>,
    categories: HashMap<OrgId, HashSet<CategoryId>>,
}

/// Thread-safe in-memory membership directory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    state: RwLock<DirectoryState>,
}

impl InMemoryDirectory {
    /// Create a new empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `user_id` as a member of `org_id`.
    pub fn add_member(&self, org_id: OrgId, user_id: UserId) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("directory.add_member"))?;
        state.members.entry(org_id).or_default().insert(user_id);
        Ok(())
    }

    /// Remove `user_id` from `org_id`. Returns true if it was a member.
    pub fn remove_member(&self, org_id: &OrgId, user_id: &UserId) -> Result<bool, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("directory.remove_member"))?;
        Ok(state
            .members
            .get_mut(org_id)
            .is_some_and(|members| members.remove(user_id)))
    }

    /// Record `category_id` as belonging to `org_id`.
    pub fn add_category(&self, org_id: OrgId, category_id: CategoryId) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("directory.add_category"))?;
        state.categories.entry(org_id).or_default().insert(category_id);
        Ok(())
    }
}

impl Directory for InMemoryDirectory {
    fn is_member(&self, org_id: &OrgId, user_id: &UserId) -> Result<bool, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("directory.is_member"))?;
        Ok(state
            .members
            .get(org_id)
            .is_some_and(|members| members.contains(user_id)))
    }

    fn category_in_org(&self, org_id: &OrgId, category_id: &CategoryId) -> Result<bool, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("directory.category_in_org"))?;
        Ok(state
            .categories
            .get(org_id)
            .is_some_and(|categories| categories.contains(category_id)))
    }
}
