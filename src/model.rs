//! Result model shared by the runner, the result data files and the reporters.
//!
//! [`Rule`] and [`RuleResult`] are created fresh on every run and never
//! mutated afterwards. [`RuleSummary`] is derived from a result list by the
//! [`consolidate`](crate::consolidate) module and is never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::priority::Priority;

/// Identity and metadata of one evaluated rule.
///
/// `rule_class` is the fully-qualified name of the provider that contributed
/// the rule and `rule_name` the identifier it was registered under. The
/// priority is the *effective* priority, i.e. after overrides were applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Provider that contributed the rule.
    pub rule_class: String,
    /// Identifier within the provider.
    pub rule_name: String,
    pub description: String,
    /// Effective priority.
    pub priority: Priority,
}

impl Rule {
    /// Creates a rule identity.
    pub fn new(
        rule_class: impl Into<String>,
        rule_name: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            rule_class: rule_class.into(),
            rule_name: rule_name.into(),
            description: description.into(),
            priority,
        }
    }
}

/// Classification of a single result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleResultStatus {
    /// The rule held for every selected class.
    Pass,
    /// One violation.
    Fail,
    /// The rule's selection matched no classes.
    NoMatch,
}

impl fmt::Display for RuleResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuleResultStatus::Pass => "PASS",
            RuleResultStatus::Fail => "FAIL",
            RuleResultStatus::NoMatch => "NO_MATCH",
        })
    }
}

/// One entry of a run's result set.
///
/// A passing rule yields a single `Pass` entry with an empty message, a rule
/// whose selection matched nothing yields a single `NoMatch` entry, and a
/// failing rule yields one `Fail` entry per violation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule: Rule,
    /// Violation detail; empty for `Pass`.
    pub message: String,
    pub status: RuleResultStatus,
}

impl RuleResult {
    /// Creates a result for `rule`.
    pub fn new(rule: Rule, message: impl Into<String>, status: RuleResultStatus) -> Self {
        Self {
            rule,
            message: message.into(),
            status,
        }
    }

    /// The single result recorded for a rule without violations.
    pub fn pass(rule: Rule) -> Self {
        Self::new(rule, "", RuleResultStatus::Pass)
    }

    /// Whether this entry is a `Fail`.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status == RuleResultStatus::Fail
    }
}

/// Per-rule aggregate used for the console summary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSummary {
    pub rule_class: String,
    pub rule_name: String,
    pub priority: Priority,
    /// Number of distinct `Fail` entries.
    pub failure_count: usize,
    /// Whether every result recorded for the rule was a no-match.
    pub no_match: bool,
}

impl RuleSummary {
    /// A summary is passing when it has no `Fail` entries; it may still be a no-match.
    #[must_use]
    pub fn is_passing(&self) -> bool {
        self.failure_count == 0
    }
}
