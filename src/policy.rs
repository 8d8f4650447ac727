//! Policy records: the candidates fed to the resolver.
//!
//! A policy pairs an optional user scope and an optional category scope with
//! an exact decimal spending ceiling. Everything else about a policy (name,
//! review mode, period) is descriptive payload that resolution passes through
//! untouched, so the payload type is a generic parameter.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{CategoryId, OrgId, PolicyId, UserId};

/// How often the ceiling applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Period {
    /// The ceiling applies to each individual expense.
    PerExpense,
}

impl Default for Period {
    fn default() -> Self {
        Self::PerExpense
    }
}

/// What happens to an expense that falls under the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewMode {
    /// Expenses within the limit are approved without a reviewer.
    AutoApprove,
    /// Every expense goes to a reviewer.
    ManualReview,
}

impl Default for ReviewMode {
    fn default() -> Self {
        Self::ManualReview
    }
}

/// Default descriptive payload carried by a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDetails {
    /// Display name.
    pub name: String,

    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Period the ceiling applies to.
    #[serde(default)]
    pub period: Period,

    /// Review mode for expenses under this policy.
    #[serde(default)]
    pub review_mode: ReviewMode,

    /// When the policy was created.
    pub created_at: DateTime<Utc>,
}

impl Default for PolicyDetails {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            period: Period::default(),
            review_mode: ReviewMode::default(),
            created_at: Utc::now(),
        }
    }
}

/// A spend-authorization rule scoped to a user, a category, both, or neither.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use spendpolicy::{OrgId, Policy};
///
/// let policy = Policy::builder()
///     .org(OrgId::new("acme").unwrap())
///     .name("Default")
///     .max_amount(Decimal::new(100, 0))
///     .build()
///     .unwrap();
/// assert!(policy.user_id.is_none());
/// assert!(policy.category_id.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy<P = PolicyDetails> {
    /// Unique policy identifier.
    pub id: PolicyId,

    /// Owning organization.
    pub org_id: OrgId,

    /// User scope; `None` applies to every member of the organization.
    pub user_id: Option<UserId>,

    /// Category scope; `None` applies to every category.
    pub category_id: Option<CategoryId>,

    /// Inclusive spending ceiling.
    pub max_amount: Decimal,

    /// Opaque payload, never inspected during resolution.
    pub details: P,
}

impl Policy<PolicyDetails> {
    /// Creates a builder carrying the default [`PolicyDetails`] payload.
    #[must_use]
    pub fn builder() -> PolicyBuilder<PolicyDetails> {
        PolicyBuilder::new()
    }
}

impl<P> Policy<P> {
    /// Returns true if the policy has no user scope.
    #[must_use]
    pub const fn is_org_level(&self) -> bool {
        self.user_id.is_none()
    }

    /// Returns true if the policy has no category scope.
    #[must_use]
    pub const fn is_all_categories(&self) -> bool {
        self.category_id.is_none()
    }

    /// Replaces the payload, keeping scope and limit intact.
    pub fn map_details<Q>(self, f: impl FnOnce(P) -> Q) -> Policy<Q> {
        Policy {
            id: self.id,
            org_id: self.org_id,
            user_id: self.user_id,
            category_id: self.category_id,
            max_amount: self.max_amount,
            details: f(self.details),
        }
    }
}

/// Builder for [`Policy`].
#[derive(Debug, Clone)]
pub struct PolicyBuilder<P = PolicyDetails> {
    id: Option<PolicyId>,
    org_id: Option<OrgId>,
    user_id: Option<UserId>,
    category_id: Option<CategoryId>,
    max_amount: Option<Decimal>,
    details: P,
}

impl PolicyBuilder<PolicyDetails> {
    /// Creates a new policy builder with default details.
    #[must_use]
    pub fn new() -> Self {
        Self::with_details(PolicyDetails::default())
    }

    /// Set the display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.details.name = name.into();
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.details.description = Some(description.into());
        self
    }

    /// Set the review mode (default: `ManualReview`).
    #[must_use]
    pub fn review_mode(mut self, mode: ReviewMode) -> Self {
        self.details.review_mode = mode;
        self
    }

    /// Set the period (default: `PerExpense`).
    #[must_use]
    pub fn period(mut self, period: Period) -> Self {
        self.details.period = period;
        self
    }

    /// Override the creation timestamp.
    #[must_use]
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.details.created_at = at;
        self
    }
}

impl Default for PolicyBuilder<PolicyDetails> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> PolicyBuilder<P> {
    /// Creates a builder carrying a caller-defined payload.
    #[must_use]
    pub fn with_details(details: P) -> Self {
        Self {
            id: None,
            org_id: None,
            user_id: None,
            category_id: None,
            max_amount: None,
            details,
        }
    }

    /// Set an explicit ID (default: random).
    #[must_use]
    pub fn id(mut self, id: PolicyId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the owning organization (required).
    #[must_use]
    pub fn org(mut self, org_id: OrgId) -> Self {
        self.org_id = Some(org_id);
        self
    }

    /// Scope the policy to a single user.
    #[must_use]
    pub fn user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Scope the policy to a single category.
    #[must_use]
    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Set the inclusive spending ceiling (required, non-negative).
    #[must_use]
    pub fn max_amount(mut self, amount: Decimal) -> Self {
        self.max_amount = Some(amount);
        self
    }

    /// Build the policy.
    ///
    /// Returns `ValidationError` if:
    /// - the organization or the ceiling is missing
    /// - the ceiling is negative
    pub fn build(self) -> Result<Policy<P>, ValidationError> {
        let org_id = self.org_id.ok_or(ValidationError::MissingField {
            field: "org_id".to_string(),
        })?;

        let max_amount = self.max_amount.ok_or(ValidationError::MissingField {
            field: "max_amount".to_string(),
        })?;

        if max_amount < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount { amount: max_amount });
        }

        Ok(Policy {
            id: self.id.unwrap_or_else(PolicyId::generate),
            org_id,
            user_id: self.user_id,
            category_id: self.category_id,
            max_amount,
            details: self.details,
        })
    }
}
