//! Policy engine: wires storage, membership checks and observers around the
//! pure resolver.
//!
//! The engine is stateless between calls. Each call fetches a fresh candidate
//! snapshot from the store, so concurrency control over policy storage stays
//! with the store implementation.

mod config;
mod observer;

pub use config::EngineConfig;
pub use observer::{EvaluationObserver, RecordingObserver};

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ExecutionError, PolicyResult};
use crate::identity::{CategoryId, OrgId};
use crate::limit::{check_limit, LimitCheck};
use crate::policy::{Policy, PolicyDetails};
use crate::query::ResolveQuery;
use crate::resolver::{resolve_query, Resolution};
use crate::scope::ScopeClass;
use crate::storage::{Directory, PolicyStore};

/// A resolved policy together with the limit decision for one amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation<P = PolicyDetails> {
    /// Organization the decision was made in.
    pub org_id: OrgId,
    /// The user/category query.
    pub query: ResolveQuery,
    /// Amount that was checked.
    pub amount: Decimal,
    /// Resolution trace.
    pub resolution: Resolution<P>,
    /// Limit decision against the winning policy.
    pub limit: LimitCheck,
    /// When the evaluation ran.
    pub evaluated_at: DateTime<Utc>,
}

impl<P> Evaluation<P> {
    /// Returns true if the amount is allowed under the winning policy.
    #[must_use]
    pub const fn allowed(&self) -> bool {
        self.limit.allowed
    }

    /// The policy that governed the decision.
    #[must_use]
    pub fn governing_policy(&self) -> Option<&Policy<P>> {
        self.resolution.selected_policy.as_ref()
    }
}

/// Spend-policy engine.
#[derive(Clone)]
pub struct PolicyEngine<P = PolicyDetails> {
    store: Arc<dyn PolicyStore<P>>,
    directory: Arc<dyn Directory>,
    observers: Vec<Arc<dyn EvaluationObserver<P>>>,
    config: EngineConfig,
}

impl<P> fmt::Debug for PolicyEngine<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl<P: Clone> PolicyEngine<P> {
    /// Create a new engine with the default configuration.
    #[must_use]
    pub fn new(store: Arc<dyn PolicyStore<P>>, directory: Arc<dyn Directory>) -> Self {
        Self {
            store,
            directory,
            observers: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    /// Replace the configuration after validating it.
    pub fn with_config(mut self, config: EngineConfig) -> PolicyResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Register an observer notified after every evaluation.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn EvaluationObserver<P>>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get a reference to the policy store.
    pub fn policy_store(&self) -> &Arc<dyn PolicyStore<P>> {
        &self.store
    }

    /// Get a reference to the membership directory.
    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    /// Resolve the governing policy for `query` within `org_id`.
    ///
    /// # Errors
    /// - `ExecutionError::NotAMember` / `CategoryNotFound` when verification
    ///   is enabled and the directory rejects the query
    /// - `ExecutionError::TooManyCandidates` when the store returns more
    ///   policies than `max_candidates`
    /// - `PolicyError::Storage` when a collaborator fails
    pub fn resolve(&self, org_id: &OrgId, query: &ResolveQuery) -> PolicyResult<Resolution<P>> {
        let candidates = self.candidates(org_id, query)?;
        let resolution = resolve_query(&candidates, query);

        if self.config.log_trace {
            for (rank, entry) in resolution.applicable_policies.iter().enumerate() {
                tracing::trace!(
                    org = %org_id,
                    rank = rank + 1,
                    policy = %entry.policy.id,
                    scope = %entry.scope,
                    reason = %entry.reason,
                    "applicable policy"
                );
            }
        }

        Ok(resolution)
    }

    /// Resolve, then check `amount` against the winning policy.
    ///
    /// Observers are notified only when evaluation succeeds.
    pub fn evaluate(
        &self,
        org_id: &OrgId,
        query: &ResolveQuery,
        amount: Decimal,
    ) -> PolicyResult<Evaluation<P>> {
        let resolution = self.resolve(org_id, query)?;
        let limit = check_limit(amount, resolution.selected_policy.as_ref());

        tracing::info!(
            org = %org_id,
            user = %query.user_id,
            category = query.category_id.as_ref().map(CategoryId::as_str),
            amount = %amount,
            scope = resolution.selected_scope().map(ScopeClass::name),
            allowed = limit.allowed,
            "evaluated spend"
        );

        let evaluation = Evaluation {
            org_id: org_id.clone(),
            query: query.clone(),
            amount,
            resolution,
            limit,
            evaluated_at: Utc::now(),
        };

        for observer in &self.observers {
            observer.on_evaluation(&evaluation);
        }

        Ok(evaluation)
    }

    fn candidates(&self, org_id: &OrgId, query: &ResolveQuery) -> PolicyResult<Vec<Policy<P>>> {
        if self.config.verify_membership && !self.directory.is_member(org_id, &query.user_id)? {
            return Err(ExecutionError::NotAMember {
                org: org_id.clone(),
                user: query.user_id.clone(),
            }
            .into());
        }

        if let Some(category_id) = query.category_id.as_ref() {
            if self.config.verify_category && !self.directory.category_in_org(org_id, category_id)? {
                return Err(ExecutionError::CategoryNotFound {
                    org: org_id.clone(),
                    category: category_id.clone(),
                }
                .into());
            }
        }

        let candidates = self.store.list_for_org(org_id)?;

        if let Some(max) = self.config.max_candidates {
            if candidates.len() > max {
                return Err(ExecutionError::TooManyCandidates {
                    max,
                    actual: candidates.len(),
                }
                .into());
            }
        }

        // Same-org candidates are the store's contract; resolution does not filter.
        let foreign = candidates.iter().filter(|p| &p.org_id != org_id).count();
        if foreign > 0 {
            tracing::warn!(org = %org_id, foreign, "store returned policies owned by another organization");
        }

        Ok(candidates)
    }
}
