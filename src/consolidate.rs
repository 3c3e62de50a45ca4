//! Grouping of raw results by rule.
//!
//! Results read from several data files may repeat the same rule (one entry
//! per source set). Consolidation keeps one group per rule, in first-seen
//! order, removes duplicate entries, and decides which entries are worth
//! reporting:
//!
//! - `FAIL` entries always are;
//! - a `NO_MATCH` entry is only when it is the rule's sole distinct result.
//!   A rule that matched nothing in one source set but ran in another is not
//!   a no-match;
//! - `PASS` entries never are.

use std::collections::HashMap;

use crate::model::{Rule, RuleResult, RuleResultStatus, RuleSummary};

/// All results recorded for one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleGroup {
    pub rule: Rule,
    /// Distinct results, in first-seen order.
    pub results: Vec<RuleResult>,
    /// The subset of `results` that should be shown in detail reports.
    pub reportable: Vec<RuleResult>,
}

impl RuleGroup {
    pub fn failure_count(&self) -> usize {
        self.reportable
            .iter()
            .filter(|r| r.status == RuleResultStatus::Fail)
            .count()
    }

    /// Every recorded result is a no-match.
    pub fn is_no_match(&self) -> bool {
        !self.results.is_empty()
            && self
                .results
                .iter()
                .all(|r| r.status == RuleResultStatus::NoMatch)
    }

    pub fn summary(&self) -> RuleSummary {
        RuleSummary {
            rule_class: self.rule.rule_class.clone(),
            rule_name: self.rule.rule_name.clone(),
            priority: self.rule.priority,
            failure_count: self.failure_count(),
            no_match: self.is_no_match(),
        }
    }
}

/// Groups `results` by rule.
pub fn consolidate(results: &[RuleResult]) -> Vec<RuleGroup> {
    let mut groups: Vec<RuleGroup> = Vec::new();
    let mut positions: HashMap<&Rule, usize> = HashMap::new();
    for result in results {
        let position = *positions.entry(&result.rule).or_insert_with(|| {
            groups.push(RuleGroup {
                rule: result.rule.clone(),
                results: Vec::new(),
                reportable: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[position];
        if !group.results.contains(result) {
            group.results.push(result.clone());
        }
    }

    for group in &mut groups {
        let only_result = group.results.len() == 1;
        group.reportable = group
            .results
            .iter()
            .filter(|r| match r.status {
                RuleResultStatus::Fail => true,
                RuleResultStatus::NoMatch => only_result,
                RuleResultStatus::Pass => false,
            })
            .cloned()
            .collect();
    }
    groups
}

/// One summary per rule, in first-seen order.
pub fn summaries(results: &[RuleResult]) -> Vec<RuleSummary> {
    consolidate(results).iter().map(RuleGroup::summary).collect()
}
