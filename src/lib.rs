//! # spendpolicy - Scoped spend-policy resolution
//!
//! Organizations define spending ceilings at four scopes: organization-wide,
//! per category, per user, and per user per category. Given a user and an
//! optional category, spendpolicy selects the single policy that governs the
//! decision and explains why it beat every other applicable policy.
//!
//! ## Core Concepts
//!
//! - **Policy**: A ceiling with an optional user scope and an optional category scope
//! - **ScopeClass**: How narrowly a policy targets the queried user/category pair
//! - **Resolution**: The winning policy plus the ordered trace of all applicable ones
//! - **LimitCheck**: An inclusive, exact-decimal comparison against the winner
//!
//! The resolver and the limit checker are pure functions. [`PolicyEngine`]
//! wraps them with a policy store, a membership directory and observers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use spendpolicy::{check_limit, resolve, CategoryId, UserId};
//!
//! let alice = UserId::new("alice")?;
//! let travel = CategoryId::new("travel")?;
//!
//! let resolution = resolve(&candidates, &alice, Some(&travel));
//! println!("{}", resolution.selection_reason);
//!
//! let decision = check_limit(amount, resolution.selected_policy.as_ref());
//! assert!(decision.allowed);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod error;
pub mod identity;
pub mod limit;
pub mod policy;
pub mod query;
pub mod resolver;
pub mod scope;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use engine::{EngineConfig, Evaluation, EvaluationObserver, PolicyEngine, RecordingObserver};
pub use error::{ExecutionError, PolicyError, PolicyResult, ValidationError};
pub use identity::{CategoryId, OrgId, PolicyId, UserId};
pub use limit::{check_limit, LimitCheck};
pub use policy::{Period, Policy, PolicyBuilder, PolicyDetails, ReviewMode};
pub use query::{ResolveBuilder, ResolveQuery};
pub use resolver::{resolve, resolve_query, ApplicablePolicy, Resolution};
pub use scope::ScopeClass;
pub use storage::{Directory, InMemoryDirectory, InMemoryPolicyStore, PolicyStore, StorageError};
