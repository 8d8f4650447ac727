//! Resolve queries and their builder.
//!
//! A query names the user an expense is for and, optionally, its category.
//! Queries are validated on construction so the resolver never runs against
//! an empty identity.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{CategoryId, UserId};

/// A validated resolve request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolveQuery {
    /// User the spend decision is for.
    pub user_id: UserId,

    /// Optional category; without it only user-wide and org-wide policies apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

impl ResolveQuery {
    /// Creates a query from validated identifiers.
    #[must_use]
    pub const fn new(user_id: UserId, category_id: Option<CategoryId>) -> Self {
        Self { user_id, category_id }
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> ResolveBuilder {
        ResolveBuilder::new()
    }

    /// Parses raw identifiers, failing fast on empty values.
    ///
    /// # Examples
    ///
    /// ```
    /// use spendpolicy::ResolveQuery;
    ///
    /// assert!(ResolveQuery::parse("alice", Some("travel")).is_ok());
    /// assert!(ResolveQuery::parse("", None).is_err());
    /// ```
    pub fn parse(user_id: &str, category_id: Option<&str>) -> Result<Self, ValidationError> {
        let user_id = UserId::new(user_id)?;
        let category_id = category_id.map(|raw| CategoryId::new(raw)).transpose()?;
        Ok(Self { user_id, category_id })
    }
}

/// Builder for [`ResolveQuery`].
///
/// # Example
/// ```rust,ignore
/// let query = ResolveBuilder::new()
///     .user(alice)
///     .category(travel)
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResolveBuilder {
    user_id: Option<UserId>,
    category_id: Option<CategoryId>,
}

impl ResolveBuilder {
    /// Creates a new builder with no user and no category.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the user (required).
    #[must_use]
    pub fn user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Restrict to a category (optional).
    #[must_use]
    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Build the query.
    ///
    /// Returns `ValidationError::MissingField` if no user was set.
    pub fn build(self) -> Result<ResolveQuery, ValidationError> {
        let user_id = self.user_id.ok_or(ValidationError::MissingField {
            field: "user_id".to_string(),
        })?;

        Ok(ResolveQuery {
            user_id,
            category_id: self.category_id,
        })
    }
}
