//! Build gate over persisted results.

use crate::error::{ArchRulesError, Result};
use crate::model::{RuleResult, RuleResultStatus};
use crate::priority::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnforceOptions {
    /// Lowest priority that fails the gate; `None` never fails.
    pub failure_threshold: Option<Priority>,
    /// Count no-match results as failures.
    pub fail_on_no_match: bool,
}

impl Default for EnforceOptions {
    fn default() -> Self {
        Self {
            failure_threshold: Some(Priority::Low),
            fail_on_no_match: false,
        }
    }
}

/// Fails when any counted result's priority meets the threshold.
///
/// # Errors
///
/// Returns [`ArchRulesError::EnforcementError`] listing one
/// `ruleName (PRIORITY)` line per offending result.
pub fn enforce(results: &[RuleResult], options: &EnforceOptions) -> Result<()> {
    let Some(threshold) = options.failure_threshold else {
        return Ok(());
    };
    let failures: Vec<String> = results
        .iter()
        .filter(|r| match r.status {
            RuleResultStatus::Fail => true,
            RuleResultStatus::NoMatch => options.fail_on_no_match,
            RuleResultStatus::Pass => false,
        })
        .filter(|r| r.rule.priority.meets_threshold(Some(threshold)))
        .map(|r| format!("{} ({})", r.rule.rule_name, r.rule.priority))
        .collect();
    if failures.is_empty() {
        tracing::debug!(%threshold, "No rule failures at or above threshold");
        return Ok(());
    }
    Err(ArchRulesError::EnforcementError { failures })
}
