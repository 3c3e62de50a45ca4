//! ArchRule Trait
//!
//! This module defines the [`ArchRule`] trait, the opaque predicate-plus-assertion
//! that providers contribute and the engine runs against a [`CodeGraph`].
//!
//! # Overview
//!
//! A rule is asked for a [`Verdict`] under a [`SelectionPolicy`]:
//!
//! - [`Verdict::Clean`]: the rule held for every selected class
//! - [`Verdict::Violations`]: one message per violating element
//! - [`Verdict::EmptySelection`]: the rule's target selection matched nothing and the
//!   policy did not allow that
//!
//! Under [`SelectionPolicy::Lenient`] an empty selection is never reported; rules
//! evaluate to `Clean` (or to the violations of their other clauses) instead.
//! Errors returned from [`ArchRule::check`] are genuine faults and abort the run.
//!
//! # Implementing a Custom Rule
//!
//! Most rules are built with the [`lang`](crate::lang) builder, but any type can
//! implement the trait:
//!
//! ```rust
//! use archrules_core::graph::CodeGraph;
//! use archrules_core::rule::{ArchRule, SelectionPolicy, Verdict};
//! use archrules_core::{Priority, Result};
//!
//! struct NotEmpty;
//!
//! impl ArchRule for NotEmpty {
//!     fn description(&self) -> String {
//!         "the codebase should contain classes".to_string()
//!     }
//!
//!     fn priority(&self) -> Priority {
//!         Priority::Low
//!     }
//!
//!     fn check(&self, graph: &CodeGraph, _policy: SelectionPolicy) -> Result<Verdict> {
//!         if graph.is_empty() {
//!             Ok(Verdict::Violations(vec!["no classes were imported".to_string()]))
//!         } else {
//!             Ok(Verdict::Clean)
//!         }
//!     }
//! }
//! ```

use crate::error::Result;
use crate::graph::CodeGraph;
use crate::priority::Priority;

/// How a rule must treat a target selection that matched no elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Report [`Verdict::EmptySelection`] unless the rule itself allows empty selections.
    Strict,
    /// Treat an empty selection as vacuously satisfied.
    Lenient,
}

/// Result of running one rule against a code graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    Violations(Vec<String>),
    EmptySelection,
}

impl Verdict {
    /// Builds a verdict from collected violation messages.
    pub fn from_violations(violations: Vec<String>) -> Self {
        if violations.is_empty() {
            Verdict::Clean
        } else {
            Verdict::Violations(violations)
        }
    }

    #[must_use]
    pub fn has_violations(&self) -> bool {
        matches!(self, Verdict::Violations(v) if !v.is_empty())
    }
}

/// A structural rule: a target selection plus an assertion over the selected elements.
///
/// Implementations must be pure with respect to the graph; the same rule may be
/// checked twice in one run (strictly, then leniently).
pub trait ArchRule: Send + Sync {
    /// Human-readable description, used verbatim in reports.
    fn description(&self) -> String;

    /// Declared priority, before any override.
    fn priority(&self) -> Priority;

    /// Evaluates the rule.
    ///
    /// # Errors
    ///
    /// Returns an [`ArchRulesError`](crate::error::ArchRulesError) when the rule
    /// cannot be evaluated at all. Empty selections are not errors.
    fn check(&self, graph: &CodeGraph, policy: SelectionPolicy) -> Result<Verdict>;

    /// Combines this rule with `other`; both must hold.
    fn and(self, other: impl ArchRule + 'static) -> CompositeRule
    where
        Self: Sized + 'static,
    {
        let priority = self.priority();
        CompositeRule::of(priority, vec![Box::new(self), Box::new(other)])
    }
}

impl ArchRule for Box<dyn ArchRule> {
    fn description(&self) -> String {
        self.as_ref().description()
    }

    fn priority(&self) -> Priority {
        self.as_ref().priority()
    }

    fn check(&self, graph: &CodeGraph, policy: SelectionPolicy) -> Result<Verdict> {
        self.as_ref().check(graph, policy)
    }
}

/// Several rules evaluated as one.
///
/// Under the strict policy, any clause with an empty selection makes the whole
/// composite an [`Verdict::EmptySelection`], even if other clauses found
/// violations. Under the lenient policy, violations of all clauses are concatenated.
pub struct CompositeRule {
    priority: Priority,
    rules: Vec<Box<dyn ArchRule>>,
}

impl CompositeRule {
    pub fn of(priority: Priority, rules: Vec<Box<dyn ArchRule>>) -> Self {
        Self { priority, rules }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn and_also(mut self, other: impl ArchRule + 'static) -> Self {
        self.rules.push(Box::new(other));
        self
    }
}

impl ArchRule for CompositeRule {
    fn description(&self) -> String {
        self.rules
            .iter()
            .map(|r| r.description())
            .collect::<Vec<_>>()
            .join(" and ")
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn check(&self, graph: &CodeGraph, policy: SelectionPolicy) -> Result<Verdict> {
        let mut violations = Vec::new();
        let mut empty_selection = false;
        for rule in &self.rules {
            match rule.check(graph, policy)? {
                Verdict::Clean => {}
                Verdict::Violations(found) => violations.extend(found),
                Verdict::EmptySelection => empty_selection = true,
            }
        }
        if empty_selection {
            return Ok(Verdict::EmptySelection);
        }
        Ok(Verdict::from_violations(violations))
    }
}

/// Helper macro for creating evaluation errors with rule context.
///
/// # Examples
///
/// ```rust
/// # use archrules_core::evaluation_error;
/// let error = evaluation_error!("no-cycles", "class {} vanished from the graph", "a.B");
/// assert!(error.to_string().contains("a.B"));
/// ```
#[macro_export]
macro_rules! evaluation_error {
    ($rule:expr, $msg:expr) => {
        $crate::error::ArchRulesError::evaluation_error($rule, $msg)
    };
    ($rule:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::ArchRulesError::evaluation_error($rule, format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchRulesError;

    /// Returns a fixed verdict per policy.
    struct Fixed {
        strict: Verdict,
        lenient: Verdict,
    }

    impl ArchRule for Fixed {
        fn description(&self) -> String {
            "fixed".to_string()
        }

        fn priority(&self) -> Priority {
            Priority::Low
        }

        fn check(&self, _graph: &CodeGraph, policy: SelectionPolicy) -> Result<Verdict> {
            Ok(match policy {
                SelectionPolicy::Strict => self.strict.clone(),
                SelectionPolicy::Lenient => self.lenient.clone(),
            })
        }
    }

    struct Faulty;

    impl ArchRule for Faulty {
        fn description(&self) -> String {
            "faulty".to_string()
        }

        fn priority(&self) -> Priority {
            Priority::High
        }

        fn check(&self, _graph: &CodeGraph, _policy: SelectionPolicy) -> Result<Verdict> {
            Err(evaluation_error!("faulty", "cannot evaluate"))
        }
    }

    fn violations(msgs: &[&str]) -> Verdict {
        Verdict::Violations(msgs.iter().map(|m| m.to_string()).collect())
    }

    #[test]
    fn test_from_violations_empty_is_clean() {
        assert_eq!(Verdict::from_violations(vec![]), Verdict::Clean);
        assert!(Verdict::from_violations(vec!["x".to_string()]).has_violations());
    }

    #[test]
    fn test_composite_strict_empty_selection_masks_violations() {
        let composite = Fixed {
            strict: violations(&["real"]),
            lenient: violations(&["real"]),
        }
        .and(Fixed {
            strict: Verdict::EmptySelection,
            lenient: Verdict::Clean,
        });
        let graph = CodeGraph::default();
        assert_eq!(
            composite.check(&graph, SelectionPolicy::Strict).unwrap(),
            Verdict::EmptySelection
        );
        assert_eq!(
            composite.check(&graph, SelectionPolicy::Lenient).unwrap(),
            violations(&["real"])
        );
    }

    #[test]
    fn test_composite_concatenates_violations_in_clause_order() {
        let composite = CompositeRule::of(
            Priority::High,
            vec![
                Box::new(Fixed {
                    strict: violations(&["first"]),
                    lenient: Verdict::Clean,
                }),
                Box::new(Fixed {
                    strict: violations(&["second"]),
                    lenient: Verdict::Clean,
                }),
            ],
        );
        let verdict = composite
            .check(&CodeGraph::default(), SelectionPolicy::Strict)
            .unwrap();
        assert_eq!(verdict, violations(&["first", "second"]));
        assert_eq!(composite.priority(), Priority::High);
        assert_eq!(composite.description(), "fixed and fixed");
    }

    #[test]
    fn test_composite_propagates_faults() {
        let composite = Fixed {
            strict: Verdict::Clean,
            lenient: Verdict::Clean,
        }
        .and(Faulty);
        let err = composite
            .check(&CodeGraph::default(), SelectionPolicy::Strict)
            .unwrap_err();
        assert!(matches!(err, ArchRulesError::EvaluationError { .. }));
    }

    #[test]
    fn test_and_keeps_priority_of_left_rule() {
        let composite = Faulty.and(Fixed {
            strict: Verdict::Clean,
            lenient: Verdict::Clean,
        });
        assert_eq!(composite.priority(), Priority::High);
    }
}
