//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services behind an `Arc`. Services never read process-wide environment
//! variables themselves; the embedding application reads them and hands the raw values to
//! [`CoreConfig::from_env_values`].

use crate::constants::{
    DEFAULT_MIN_REVIEWERS, DEFAULT_UNDO_DEPTH, ENV_DISPATCH_POLICY, ENV_MIN_REVIEWERS,
    ENV_UNDO_DEPTH,
};
use crate::{CoreError, CoreResult};
use std::str::FromStr;

/// What the assignment dispatcher does with already-created records when a later request fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Leave earlier records in place and report the partial batch.
    #[default]
    LeavePartial,
    /// Delete earlier records of the batch, newest first, before reporting the failure.
    Compensate,
}

impl FromStr for DispatchPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "leave_partial" => Ok(DispatchPolicy::LeavePartial),
            "compensate" => Ok(DispatchPolicy::Compensate),
            other => Err(CoreError::InvalidInput(format!(
                "{ENV_DISPATCH_POLICY} must be 'leave_partial' or 'compensate', got '{other}'"
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    min_reviewers: usize,
    dispatch_policy: DispatchPolicy,
    undo_depth: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            min_reviewers: DEFAULT_MIN_REVIEWERS,
            dispatch_policy: DispatchPolicy::default(),
            undo_depth: DEFAULT_UNDO_DEPTH,
        }
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if `min_reviewers` is below 2.
    pub fn new(
        min_reviewers: usize,
        dispatch_policy: DispatchPolicy,
        undo_depth: usize,
    ) -> CoreResult<Self> {
        if min_reviewers < DEFAULT_MIN_REVIEWERS {
            return Err(CoreError::InvalidInput(format!(
                "min_reviewers must be at least {DEFAULT_MIN_REVIEWERS}, got {min_reviewers}"
            )));
        }

        Ok(Self {
            min_reviewers,
            dispatch_policy,
            undo_depth,
        })
    }

    /// Build a config from optional raw values, as read from `DRT_MIN_REVIEWERS`,
    /// `DRT_DISPATCH_POLICY` and `DRT_UNDO_DEPTH`.
    ///
    /// Absent or blank values fall back to defaults.
    pub fn from_env_values(
        min_reviewers: Option<String>,
        dispatch_policy: Option<String>,
        undo_depth: Option<String>,
    ) -> CoreResult<Self> {
        let min_reviewers = count_from_env_value(ENV_MIN_REVIEWERS, min_reviewers)?
            .unwrap_or(DEFAULT_MIN_REVIEWERS);
        let dispatch_policy = non_blank(dispatch_policy)
            .map(|v| v.parse::<DispatchPolicy>())
            .transpose()?
            .unwrap_or_default();
        let undo_depth =
            count_from_env_value(ENV_UNDO_DEPTH, undo_depth)?.unwrap_or(DEFAULT_UNDO_DEPTH);

        Self::new(min_reviewers, dispatch_policy, undo_depth)
    }

    pub fn min_reviewers(&self) -> usize {
        self.min_reviewers
    }

    pub fn dispatch_policy(&self) -> DispatchPolicy {
        self.dispatch_policy
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_depth
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn count_from_env_value(name: &str, value: Option<String>) -> CoreResult<Option<usize>> {
    non_blank(value)
        .map(|v| {
            v.parse::<usize>().map_err(|_| {
                CoreError::InvalidInput(format!("{name} must be a whole number, got '{v}'"))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_values_use_defaults() {
        let cfg = CoreConfig::from_env_values(None, Some("  ".into()), None).expect("defaults");
        assert_eq!(cfg, CoreConfig::default());
        assert_eq!(cfg.min_reviewers(), 2);
        assert_eq!(cfg.dispatch_policy(), DispatchPolicy::LeavePartial);
        assert_eq!(cfg.undo_depth(), 32);
    }

    #[test]
    fn values_are_parsed() {
        let cfg = CoreConfig::from_env_values(
            Some("3".into()),
            Some("Compensate".into()),
            Some("0".into()),
        )
        .expect("valid values");
        assert_eq!(cfg.min_reviewers(), 3);
        assert_eq!(cfg.dispatch_policy(), DispatchPolicy::Compensate);
        assert_eq!(cfg.undo_depth(), 0);

        let policy: DispatchPolicy = "leave-partial".parse().expect("hyphenated form");
        assert_eq!(policy, DispatchPolicy::LeavePartial);
    }

    #[test]
    fn quorum_below_two_is_rejected() {
        let err = CoreConfig::from_env_values(Some("1".into()), None, None).expect_err("too small");
        assert!(matches!(err, CoreError::InvalidInput(msg) if msg.contains("min_reviewers")));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = CoreConfig::from_env_values(Some("two".into()), None, None).expect_err("nan");
        assert!(matches!(err, CoreError::InvalidInput(msg) if msg.contains(ENV_MIN_REVIEWERS)));

        let err =
            CoreConfig::from_env_values(None, Some("rollback".into()), None).expect_err("policy");
        assert!(matches!(err, CoreError::InvalidInput(msg) if msg.contains(ENV_DISPATCH_POLICY)));

        let err = CoreConfig::from_env_values(None, None, Some("-1".into())).expect_err("depth");
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }
}
