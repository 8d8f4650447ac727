//! Engine configuration.

use serde::Deserialize;

use crate::error::ValidationError;

/// Configuration for [`PolicyEngine`](super::PolicyEngine).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Reject queries for users who are not members of the organization.
    pub verify_membership: bool,
    /// Reject queries for categories that do not belong to the organization.
    pub verify_category: bool,
    /// Upper bound on the candidate list fetched per organization.
    pub max_candidates: Option<usize>,
    /// Emit one `trace` event per applicable policy.
    pub log_trace: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verify_membership: true,
            verify_category: true,
            max_candidates: None,
            log_trace: false,
        }
    }
}

impl EngineConfig {
    /// Parses a JSON configuration document; omitted fields take defaults.
    pub fn from_json(raw: &str) -> Result<Self, ValidationError> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ValidationError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks internal consistency.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_candidates == Some(0) {
            return Err(ValidationError::InvalidConfig {
                reason: "max_candidates must be positive when set".to_string(),
            });
        }
        Ok(())
    }
}
