//! Scope options: how teardown reacts to failing cleanup handles.
//!
//! With the `config` feature the options derive serde and can be loaded
//! from JSON alongside the rest of an application's configuration.

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// What teardown does after a cleanup handle fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "kebab-case"))]
pub enum CleanupPolicy {
    /// Release every remaining handle and report all failures together
    #[default]
    DrainAll,
    /// Stop at the first failure; handles not yet released are dropped
    StopOnFirstError,
}

/// Options applied to every scope opened from a compiled schema.
///
/// # Examples
///
/// ```
/// use almond_di::{CleanupPolicy, ScopeOptions};
///
/// let options = ScopeOptions::new().cleanup_policy(CleanupPolicy::StopOnFirstError);
/// assert_eq!(options.policy(), CleanupPolicy::StopOnFirstError);
/// assert_eq!(ScopeOptions::default().policy(), CleanupPolicy::DrainAll);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default, rename_all = "kebab-case"))]
pub struct ScopeOptions {
    cleanup_policy: CleanupPolicy,
}

impl ScopeOptions {
    /// Default options: drain all handles on teardown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cleanup policy.
    pub fn cleanup_policy(mut self, policy: CleanupPolicy) -> Self {
        self.cleanup_policy = policy;
        self
    }

    /// The configured cleanup policy.
    pub fn policy(&self) -> CleanupPolicy {
        self.cleanup_policy
    }
}

#[cfg(feature = "config")]
impl ScopeOptions {
    /// Parses options from JSON, e.g. `{"cleanup-policy": "stop-on-first-error"}`.
    ///
    /// Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> crate::DiResult<Self> {
        serde_json::from_str(json).map_err(|e| crate::DiError::InvalidOptions(e.to_string()))
    }

    /// Serializes the options to JSON.
    pub fn to_json_string(&self) -> crate::DiResult<String> {
        serde_json::to_string(self).map_err(|e| crate::DiError::InvalidOptions(e.to_string()))
    }
}
