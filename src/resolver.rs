//! Policy resolution: pick the single governing policy and explain why.
//!
//! Resolution is pure (no I/O, no mutation of inputs) so the same candidate
//! list always yields the same winner and the same trace.

use serde::{Deserialize, Serialize};

use crate::identity::{CategoryId, UserId};
use crate::policy::{Policy, PolicyDetails};
use crate::query::ResolveQuery;
use crate::scope::ScopeClass;

/// One applicable candidate in the resolution trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicablePolicy<P = PolicyDetails> {
    /// The matching policy.
    pub policy: Policy<P>,
    /// Scope class it matched under.
    pub scope: ScopeClass,
    /// Human-readable explanation of the match.
    pub reason: String,
}

/// Result of a single resolve call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution<P = PolicyDetails> {
    /// The winning policy, if any candidate applied.
    pub selected_policy: Option<Policy<P>>,

    /// Every applicable candidate, winner first.
    pub applicable_policies: Vec<ApplicablePolicy<P>>,

    /// One sentence summarizing the outcome.
    pub selection_reason: String,
}

impl<P> Resolution<P> {
    /// Returns true if a policy was selected.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.selected_policy.is_some()
    }

    /// Returns the winning trace entry.
    #[must_use]
    pub fn winner(&self) -> Option<&ApplicablePolicy<P>> {
        self.applicable_policies.first()
    }

    /// Scope class of the winner.
    #[must_use]
    pub fn selected_scope(&self) -> Option<ScopeClass> {
        self.winner().map(|w| w.scope)
    }

    /// Scope classes of the trace, in precedence order.
    #[must_use]
    pub fn scopes(&self) -> Vec<ScopeClass> {
        self.applicable_policies.iter().map(|a| a.scope).collect()
    }
}

impl<P: Serialize> Resolution<P> {
    /// Renders the resolution as pretty-printed JSON for operators.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Resolve the governing policy for a user and optional category.
///
/// Precedence (highest to lowest):
/// 1. user + category
/// 2. organization + category
/// 3. user, all categories
/// 4. organization, all categories
///
/// Candidates of the same class keep their input order. Candidates are
/// assumed to belong to one organization; no org filtering happens here.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use spendpolicy::{resolve, OrgId, Policy, ScopeClass, UserId};
///
/// let org = OrgId::new("acme").unwrap();
/// let alice = UserId::new("alice").unwrap();
/// let candidates = vec![
///     Policy::builder().org(org.clone()).max_amount(Decimal::new(100, 0)).build().unwrap(),
///     Policy::builder().org(org).user(alice.clone()).max_amount(Decimal::new(300, 0)).build().unwrap(),
/// ];
///
/// let resolution = resolve(&candidates, &alice, None);
/// assert_eq!(resolution.selected_scope(), Some(ScopeClass::UserWide));
/// assert_eq!(resolution.applicable_policies.len(), 2);
/// ```
#[must_use]
pub fn resolve<P: Clone>(
    candidates: &[Policy<P>],
    user_id: &UserId,
    category_id: Option<&CategoryId>,
) -> Resolution<P> {
    let mut applicable: Vec<ApplicablePolicy<P>> = candidates
        .iter()
        .filter_map(|policy| {
            let scope = ScopeClass::classify(policy, user_id, category_id)?;
            Some(ApplicablePolicy {
                policy: policy.clone(),
                scope,
                reason: scope.describe(user_id, category_id),
            })
        })
        .collect();

    // Stable: equal classes stay in input order.
    applicable.sort_by_key(|a| a.scope);

    let selected_policy = applicable.first().map(|a| a.policy.clone());
    let selection_reason = match (applicable.first(), category_id) {
        (Some(winner), _) => format!("Selected {} policy: {}", winner.scope, winner.reason),
        (None, Some(category)) => {
            format!("No applicable policy found for user {user_id} and category {category}")
        }
        (None, None) => format!("No applicable policy found for user {user_id}"),
    };

    tracing::debug!(
        user = %user_id,
        category = category_id.map(CategoryId::as_str),
        candidates = candidates.len(),
        applicable = applicable.len(),
        selected = selected_policy.as_ref().map(|p| p.id.as_str()),
        "resolved spend policy"
    );

    Resolution {
        selected_policy,
        applicable_policies: applicable,
        selection_reason,
    }
}

/// Resolve against a validated [`ResolveQuery`].
#[must_use]
pub fn resolve_query<P: Clone>(candidates: &[Policy<P>], query: &ResolveQuery) -> Resolution<P> {
    resolve(candidates, &query.user_id, query.category_id.as_ref())
}
