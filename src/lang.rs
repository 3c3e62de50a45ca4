//! A small builder for "classes that X should Y" rules.
//!
//! ```rust
//! use archrules_core::lang::{classes, ClassCondition, ClassPredicate};
//! use archrules_core::Priority;
//!
//! let rule = classes()
//!     .that(ClassPredicate::simple_name("SmokeTest"))
//!     .should(ClassCondition::be_annotated_with("Deprecated"))
//!     .with_priority(Priority::Medium);
//! ```
//!
//! When the `that` selection matches no classes, strict evaluation reports an
//! empty selection unless [`ClassesRule::allow_empty_should`] was set.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::graph::{ClassNode, CodeGraph};
use crate::priority::Priority;
use crate::rule::{ArchRule, SelectionPolicy, Verdict};

type PredicateFn = dyn Fn(&ClassNode, &CodeGraph) -> bool + Send + Sync;
type ConditionFn = dyn Fn(&ClassNode, &CodeGraph, &mut Vec<String>) -> Result<()> + Send + Sync;

/// Selects the classes a rule applies to.
#[derive(Clone)]
pub struct ClassPredicate {
    description: String,
    test: Arc<PredicateFn>,
}

impl ClassPredicate {
    pub fn new(
        description: impl Into<String>,
        test: impl Fn(&ClassNode, &CodeGraph) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            test: Arc::new(test),
        }
    }

    pub fn simple_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(format!("have simple name '{name}'"), move |c, _| {
            c.simple_name() == name
        })
    }

    /// Classes whose package equals `package` or is nested below it.
    pub fn reside_in_package(package: impl Into<String>) -> Self {
        let package = package.into();
        Self::new(format!("reside in package '{package}'"), move |c, _| {
            let pkg = c.package_name();
            pkg == package
                || pkg
                    .strip_prefix(package.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    pub fn annotated_with(annotation: impl Into<String>) -> Self {
        let annotation = annotation.into();
        Self::new(format!("are annotated with @{annotation}"), move |c, _| {
            c.is_annotated_with(&annotation)
        })
    }

    #[must_use]
    pub fn and(self, other: ClassPredicate) -> Self {
        let description = format!("{} and {}", self.description, other.description);
        Self::new(description, move |c, g| self.matches(c, g) && other.matches(c, g))
    }

    pub fn matches(&self, class: &ClassNode, graph: &CodeGraph) -> bool {
        (self.test)(class, graph)
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for ClassPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassPredicate")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// The assertion applied to every selected class. Violations are pushed as messages.
#[derive(Clone)]
pub struct ClassCondition {
    description: String,
    check: Arc<ConditionFn>,
}

impl ClassCondition {
    pub fn new(
        description: impl Into<String>,
        check: impl Fn(&ClassNode, &CodeGraph, &mut Vec<String>) -> Result<()>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            check: Arc::new(check),
        }
    }

    pub fn be_annotated_with(annotation: impl Into<String>) -> Self {
        let annotation = annotation.into();
        Self::new(
            format!("be annotated with @{annotation}"),
            move |c, _, events| {
                if !c.is_annotated_with(&annotation) {
                    events.push(format!(
                        "Class <{}> is not annotated with @{}",
                        c.name, annotation
                    ));
                }
                Ok(())
            },
        )
    }

    pub fn not_be_annotated_with(annotation: impl Into<String>) -> Self {
        let annotation = annotation.into();
        Self::new(
            format!("not be annotated with @{annotation}"),
            move |c, _, events| {
                if c.is_annotated_with(&annotation) {
                    events.push(format!("Class <{}> is annotated with @{}", c.name, annotation));
                }
                Ok(())
            },
        )
    }

    /// Fails classes whose package carries `annotation`.
    pub fn not_reside_in_package_annotated_with(annotation: impl Into<String>) -> Self {
        let annotation = annotation.into();
        Self::new(
            format!("not be in a package marked with @{annotation}"),
            move |c, g, events| {
                if g.package_of(c)
                    .is_some_and(|p| p.is_annotated_with(&annotation))
                {
                    events.push(format!(
                        "Class {} is in a package marked with @{}",
                        c.name, annotation
                    ));
                }
                Ok(())
            },
        )
    }

    pub fn not_depend_on_package(package: impl Into<String>) -> Self {
        let package = package.into();
        Self::new(
            format!("not depend on classes in '{package}'"),
            move |c, g, events| {
                let prefix = format!("{package}.");
                for target in g.dependencies_of(&c.name) {
                    if target.name.starts_with(&prefix) {
                        events.push(format!("Class <{}> depends on <{}>", c.name, target.name));
                    }
                }
                Ok(())
            },
        )
    }

    pub fn not_be_in_dependency_cycle() -> Self {
        Self::new("not be part of a dependency cycle", |c, g, events| {
            if g.is_in_cycle(&c.name) {
                events.push(format!("Class <{}> is part of a dependency cycle", c.name));
            }
            Ok(())
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for ClassCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassCondition")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Starting point of the builder: selects every class.
pub fn classes() -> ClassesThat {
    ClassesThat { predicate: None }
}

/// Builder stage before `should`.
#[derive(Debug, Clone)]
pub struct ClassesThat {
    predicate: Option<ClassPredicate>,
}

impl ClassesThat {
    #[must_use]
    pub fn that(mut self, predicate: ClassPredicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn should(self, condition: ClassCondition) -> ClassesRule {
        ClassesRule {
            predicate: self.predicate,
            condition,
            priority: Priority::default(),
            allow_empty_should: false,
            description_override: None,
        }
    }
}

/// A complete "classes that X should Y" rule.
#[derive(Debug, Clone)]
pub struct ClassesRule {
    predicate: Option<ClassPredicate>,
    condition: ClassCondition,
    priority: Priority,
    allow_empty_should: bool,
    description_override: Option<String>,
}

impl ClassesRule {
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Lets the rule pass when its selection is empty, even under the strict policy.
    #[must_use]
    pub fn allow_empty_should(mut self, allow: bool) -> Self {
        self.allow_empty_should = allow;
        self
    }

    #[must_use]
    pub fn because(mut self, description: impl Into<String>) -> Self {
        self.description_override = Some(description.into());
        self
    }
}

impl ArchRule for ClassesRule {
    fn description(&self) -> String {
        if let Some(description) = &self.description_override {
            return description.clone();
        }
        match &self.predicate {
            Some(p) => format!(
                "classes that {} should {}",
                p.description(),
                self.condition.description()
            ),
            None => format!("classes should {}", self.condition.description()),
        }
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn check(&self, graph: &CodeGraph, policy: SelectionPolicy) -> Result<Verdict> {
        let selected: Vec<&ClassNode> = graph
            .classes()
            .filter(|c| self.predicate.as_ref().is_none_or(|p| p.matches(c, graph)))
            .collect();

        if selected.is_empty() {
            let tolerated = self.allow_empty_should || policy == SelectionPolicy::Lenient;
            return Ok(if tolerated {
                Verdict::Clean
            } else {
                Verdict::EmptySelection
            });
        }

        let mut violations = Vec::new();
        for class in selected {
            (self.condition.check)(class, graph, &mut violations)?;
        }
        Ok(Verdict::from_violations(violations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchRulesError;
    use crate::graph::PackageNode;

    fn graph() -> CodeGraph {
        CodeGraph::new(
            vec![
                ClassNode::new("com.acme.PassingClass"),
                ClassNode::new("com.acme.FailingClass").with_annotation("Deprecated"),
                ClassNode::new("com.acme.legacy.Old").with_dependency("com.acme.PassingClass"),
                ClassNode::new("com.acmeother.Thing"),
            ],
            vec![PackageNode {
                name: "com.acme.legacy".to_string(),
                annotations: vec!["Deprecated".to_string()],
            }],
        )
    }

    #[test]
    fn test_violation_per_offending_class() {
        let rule = classes().should(ClassCondition::not_be_annotated_with("Deprecated"));
        let verdict = rule.check(&graph(), SelectionPolicy::Strict).unwrap();
        assert_eq!(
            verdict,
            Verdict::Violations(vec![
                "Class <com.acme.FailingClass> is annotated with @Deprecated".to_string()
            ])
        );
    }

    #[test]
    fn test_empty_selection_strict_vs_lenient() {
        let rule = classes()
            .that(ClassPredicate::simple_name("SmokeTest"))
            .should(ClassCondition::be_annotated_with("Deprecated"));
        assert_eq!(
            rule.check(&graph(), SelectionPolicy::Strict).unwrap(),
            Verdict::EmptySelection
        );
        assert_eq!(
            rule.check(&graph(), SelectionPolicy::Lenient).unwrap(),
            Verdict::Clean
        );
    }

    #[test]
    fn test_allow_empty_should_tolerates_empty_selection() {
        let rule = classes()
            .that(ClassPredicate::simple_name("SmokeTest"))
            .should(ClassCondition::be_annotated_with("Deprecated"))
            .allow_empty_should(true);
        assert_eq!(
            rule.check(&graph(), SelectionPolicy::Strict).unwrap(),
            Verdict::Clean
        );
    }

    #[test]
    fn test_reside_in_package_does_not_match_sibling_prefix() {
        let predicate = ClassPredicate::reside_in_package("com.acme");
        let g = graph();
        assert!(predicate.matches(g.class("com.acme.PassingClass").unwrap(), &g));
        assert!(predicate.matches(g.class("com.acme.legacy.Old").unwrap(), &g));
        assert!(!predicate.matches(g.class("com.acmeother.Thing").unwrap(), &g));
    }

    #[test]
    fn test_deprecated_package_condition() {
        let rule = classes()
            .should(ClassCondition::not_reside_in_package_annotated_with("Deprecated"));
        let verdict = rule.check(&graph(), SelectionPolicy::Strict).unwrap();
        assert_eq!(
            verdict,
            Verdict::Violations(vec![
                "Class com.acme.legacy.Old is in a package marked with @Deprecated".to_string()
            ])
        );
    }

    #[test]
    fn test_dependency_condition() {
        let rule = classes()
            .that(ClassPredicate::reside_in_package("com.acme.legacy"))
            .should(ClassCondition::not_depend_on_package("com.acme"));
        let verdict = rule.check(&graph(), SelectionPolicy::Strict).unwrap();
        assert!(verdict.has_violations());
    }

    #[test]
    fn test_description_reads_like_a_sentence() {
        let rule = classes()
            .that(ClassPredicate::simple_name("SmokeTest"))
            .should(ClassCondition::be_annotated_with("Deprecated"));
        assert_eq!(
            rule.description(),
            "classes that have simple name 'SmokeTest' should be annotated with @Deprecated"
        );
        assert_eq!(rule.clone().because("smoke").description(), "smoke");
    }

    #[test]
    fn test_condition_fault_propagates() {
        let rule = classes().should(ClassCondition::new("explode", |c, _, _| {
            Err(ArchRulesError::evaluation_error("explode", c.name.clone()))
        }));
        let err = rule.check(&graph(), SelectionPolicy::Strict).unwrap_err();
        assert!(matches!(err, ArchRulesError::EvaluationError { .. }));
    }
}
