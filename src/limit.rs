//! Limit checking against the resolved policy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::policy::Policy;

/// Outcome of comparing an amount against a policy ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitCheck {
    /// Whether the amount is within the ceiling.
    pub allowed: bool,
    /// Human-readable explanation.
    pub reason: String,
    /// The amount that was checked.
    pub amount: Decimal,
    /// The ceiling it was compared against, if a policy applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Decimal>,
}

/// Check `amount` against the ceiling of `policy`.
///
/// The ceiling is inclusive. Without a policy nothing is allowed.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use spendpolicy::{check_limit, OrgId, Policy};
///
/// let policy = Policy::builder()
///     .org(OrgId::new("acme").unwrap())
///     .max_amount(Decimal::new(100, 0))
///     .build()
///     .unwrap();
///
/// assert!(check_limit(Decimal::new(100, 0), Some(&policy)).allowed);
/// assert!(!check_limit(Decimal::new(10001, 2), Some(&policy)).allowed);
/// ```
#[must_use]
pub fn check_limit<P>(amount: Decimal, policy: Option<&Policy<P>>) -> LimitCheck {
    let Some(policy) = policy else {
        return LimitCheck {
            allowed: false,
            reason: "No applicable policy found".to_string(),
            amount,
            limit: None,
        };
    };

    let limit = policy.max_amount;
    let allowed = amount <= limit;
    let reason = if allowed {
        format!("Amount {amount} is within policy limit of {limit}")
    } else {
        format!("Amount {amount} exceeds policy limit of {limit}")
    };

    LimitCheck {
        allowed,
        reason,
        amount,
        limit: Some(limit),
    }
}
