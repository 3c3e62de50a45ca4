//! Two-phase rule evaluation.
//!
//! [`evaluate`] runs a rule strictly first. If the only problem is that the
//! rule's target selection matched nothing, the rule is re-run leniently:
//!
//! 1. lenient violations found → those violations are the outcome (the empty
//!    clause was masking real violations raised by another clause);
//! 2. otherwise → a single [`ConditionEvent::NoClassesMatched`] sentinel, whose
//!    detail is the fixed [`NO_MATCH_MESSAGE`].
//!
//! Any error from the rule propagates unchanged; it is a rule or graph defect,
//! not an outcome.

use crate::error::Result;
use crate::graph::CodeGraph;
use crate::priority::Priority;
use crate::rule::{ArchRule, SelectionPolicy, Verdict};

/// Detail message of the no-match sentinel. Downstream code recognises
/// no-match outcomes by this exact string.
pub const NO_MATCH_MESSAGE: &str = "no classes matched the required condition";

/// One event of an evaluation outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionEvent {
    Violated(String),
    /// Synthesised when the rule's selection matched nothing.
    NoClassesMatched,
}

impl ConditionEvent {
    /// The report line for this event.
    pub fn detail(&self) -> &str {
        match self {
            ConditionEvent::Violated(message) => message,
            ConditionEvent::NoClassesMatched => NO_MATCH_MESSAGE,
        }
    }
}

/// Normalised outcome of evaluating one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationOutcome {
    pub description: String,
    pub priority: Priority,
    pub events: Vec<ConditionEvent>,
}

impl EvaluationOutcome {
    #[must_use]
    pub fn has_violation(&self) -> bool {
        !self.events.is_empty()
    }

    #[must_use]
    pub fn is_no_match(&self) -> bool {
        matches!(self.events.as_slice(), [ConditionEvent::NoClassesMatched])
    }

    /// One detail line per event.
    pub fn details(&self) -> Vec<&str> {
        self.events.iter().map(ConditionEvent::detail).collect()
    }
}

/// Evaluates `rule` against `graph`, turning an empty selection into a no-match outcome.
///
/// # Errors
///
/// Propagates every error returned by the rule under either policy.
#[tracing::instrument(level = "debug", skip_all, fields(rule = %rule.description()))]
pub fn evaluate(rule: &dyn ArchRule, graph: &CodeGraph) -> Result<EvaluationOutcome> {
    let description = rule.description();
    let priority = rule.priority();
    let events = match rule.check(graph, SelectionPolicy::Strict)? {
        Verdict::Clean => Vec::new(),
        Verdict::Violations(found) => found.into_iter().map(ConditionEvent::Violated).collect(),
        Verdict::EmptySelection => {
            tracing::debug!("Selection matched no classes, re-evaluating leniently");
            match rule.check(graph, SelectionPolicy::Lenient)? {
                Verdict::Violations(found) if !found.is_empty() => {
                    found.into_iter().map(ConditionEvent::Violated).collect()
                }
                _ => vec![ConditionEvent::NoClassesMatched],
            }
        }
    };
    Ok(EvaluationOutcome {
        description,
        priority,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchRulesError;
    use crate::graph::ClassNode;
    use crate::lang::{classes, ClassCondition, ClassPredicate};

    fn no_deprecated() -> impl ArchRule {
        classes().should(ClassCondition::not_be_annotated_with("Deprecated"))
    }

    fn smoke_test_rule() -> impl ArchRule {
        classes()
            .that(ClassPredicate::simple_name("SmokeTest"))
            .should(ClassCondition::be_annotated_with("Deprecated"))
            .with_priority(Priority::Medium)
            .allow_empty_should(false)
    }

    fn graph_of(classes: Vec<ClassNode>) -> CodeGraph {
        CodeGraph::new(classes, vec![])
    }

    #[test]
    fn test_pass() {
        let graph = graph_of(vec![ClassNode::new("t.PassingClass")]);
        let outcome = evaluate(&no_deprecated(), &graph).unwrap();
        assert!(!outcome.has_violation());
    }

    #[test]
    fn test_fail() {
        let graph = graph_of(vec![ClassNode::new("t.FailingClass").with_annotation("Deprecated")]);
        let outcome = evaluate(&no_deprecated(), &graph).unwrap();
        assert!(outcome.has_violation());
        assert!(!outcome.is_no_match());
    }

    #[test]
    fn test_fail_and_pass_reports_only_violating_class() {
        let graph = graph_of(vec![
            ClassNode::new("t.PassingClass"),
            ClassNode::new("t.FailingClass").with_annotation("Deprecated"),
        ]);
        let outcome = evaluate(&no_deprecated(), &graph).unwrap();
        assert_eq!(outcome.details().len(), 1);
    }

    #[test]
    fn test_smoke_pass() {
        let graph = graph_of(vec![ClassNode::new("t.SmokeTest").with_annotation("Deprecated")]);
        let outcome = evaluate(&smoke_test_rule(), &graph).unwrap();
        assert!(!outcome.has_violation());
    }

    #[test]
    fn test_smoke_no_match_yields_sentinel() {
        let graph = graph_of(vec![ClassNode::new("t.SmokeTestFail")]);
        let outcome = evaluate(&smoke_test_rule(), &graph).unwrap();
        assert!(outcome.has_violation());
        assert!(outcome.is_no_match());
        assert_eq!(outcome.details(), vec![NO_MATCH_MESSAGE]);
        assert_eq!(outcome.priority, Priority::Medium);
    }

    #[test]
    fn test_masked_violations_are_reported_instead_of_sentinel() {
        let rule = no_deprecated().and(smoke_test_rule());
        let graph = graph_of(vec![ClassNode::new("t.FailingClass").with_annotation("Deprecated")]);
        let outcome = evaluate(&rule, &graph).unwrap();
        assert!(!outcome.is_no_match());
        assert_eq!(
            outcome.details(),
            vec!["Class <t.FailingClass> is annotated with @Deprecated"]
        );
    }

    #[test]
    fn test_unexpected_fault_propagates() {
        let rule = classes().should(ClassCondition::new("explode", |_, _, _| {
            Err(ArchRulesError::evaluation_error("explode", "boom"))
        }));
        let graph = graph_of(vec![ClassNode::new("t.A")]);
        assert!(matches!(
            evaluate(&rule, &graph),
            Err(ArchRulesError::EvaluationError { .. })
        ));
    }
}
