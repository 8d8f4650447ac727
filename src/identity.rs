//! Opaque identifiers for organizations, users, categories and policies.
//!
//! Identifiers are assigned by the surrounding system and are treated as
//! opaque strings. The only rule enforced here is that an identifier is never
//! empty: resolving against an empty identity would silently match nothing.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

fn non_empty(raw: String, kind: &'static str) -> Result<String, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::EmptyIdentifier { kind });
    }
    Ok(raw)
}

/// Declares a non-empty string identifier.
///
/// Generates the newtype, `new`/`as_str`, `Display`, and the `String`
/// conversions serde goes through, so deserialization validates too.
macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new ", $kind, " ID, rejecting empty strings.")]
            pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
                non_empty(raw.into(), $kind).map(Self)
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(raw: String) -> Result<Self, Self::Error> {
                Self::new(raw)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

opaque_id!(
    /// Identifier of an organization.
    OrgId,
    "organization"
);

opaque_id!(
    /// Identifier of a user (an organization member).
    ///
    /// # Examples
    ///
    /// ```
    /// use spendpolicy::UserId;
    ///
    /// assert!(UserId::new("alice").is_ok());
    /// assert!(UserId::new("  ").is_err());
    /// ```
    UserId,
    "user"
);

opaque_id!(
    /// Identifier of a spend category (e.g. "Travel").
    CategoryId,
    "category"
);

opaque_id!(
    /// Identifier of a policy record.
    PolicyId,
    "policy"
);

impl PolicyId {
    /// Creates a new random policy ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}
