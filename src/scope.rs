//! Scope classes and the precedence ladder.
//!
//! A scope class is derived per query, never stored: the same policy can be
//! `user-wide` for one query and inapplicable for another.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::{CategoryId, UserId};
use crate::policy::Policy;

/// How narrowly a policy targets the queried user/category pair.
///
/// Variants are declared in precedence order, so the derived `Ord` sorts
/// the most specific class first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeClass {
    /// Scoped to the queried user and the queried category.
    UserCategory,
    /// Organization-wide for the queried category.
    OrgCategory,
    /// Scoped to the queried user across all categories.
    UserWide,
    /// Organization-wide default across all users and categories.
    OrgWide,
}

impl ScopeClass {
    /// All classes, most specific first.
    pub const ALL: [Self; 4] = [Self::UserCategory, Self::OrgCategory, Self::UserWide, Self::OrgWide];

    /// Precedence rank; 1 is the most specific.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::UserCategory => 1,
            Self::OrgCategory => 2,
            Self::UserWide => 3,
            Self::OrgWide => 4,
        }
    }

    /// Returns a short stable identifier suitable for logging/debugging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UserCategory => "user-category",
            Self::OrgCategory => "org-category",
            Self::UserWide => "user-wide",
            Self::OrgWide => "org-wide",
        }
    }

    /// Classifies `policy` against a query.
    ///
    /// Returns `None` when the policy names a different user, a different
    /// category, or any category while the query has none.
    #[must_use]
    pub fn classify<P>(policy: &Policy<P>, user_id: &UserId, category_id: Option<&CategoryId>) -> Option<Self> {
        let user_match = match policy.user_id.as_ref() {
            None => false,
            Some(u) if u == user_id => true,
            Some(_) => return None,
        };

        let category_match = match (policy.category_id.as_ref(), category_id) {
            (None, _) => false,
            (Some(scoped), Some(queried)) if scoped == queried => true,
            (Some(_), _) => return None,
        };

        Some(match (user_match, category_match) {
            (true, true) => Self::UserCategory,
            (false, true) => Self::OrgCategory,
            (true, false) => Self::UserWide,
            (false, false) => Self::OrgWide,
        })
    }

    /// Human-readable explanation of what a match in this class represents.
    #[must_use]
    pub fn describe(self, user_id: &UserId, category_id: Option<&CategoryId>) -> String {
        // Category classes only arise when the query carries a category.
        let category = category_id.map_or("", CategoryId::as_str);
        match self {
            Self::UserCategory => format!("User-specific policy for category {category}"),
            Self::OrgCategory => format!("Organization-wide policy for category {category}"),
            Self::UserWide => {
                format!("User-wide policy (applies to all categories for user {user_id})")
            }
            Self::OrgWide => {
                "Organization-wide default policy (applies to all users and categories)".to_string()
            }
        }
    }
}

impl fmt::Display for ScopeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
