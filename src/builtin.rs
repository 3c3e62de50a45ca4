//! Rule providers shipped with the `archrules` binary.

use crate::error::Result;
use crate::lang::{classes, ClassCondition};
use crate::priority::Priority;
use crate::registry::{ProviderRegistry, RuleProvider, RuleSet};

/// Rules against use of deprecated code.
#[derive(Debug, Default)]
pub struct DeprecationRules;

impl RuleProvider for DeprecationRules {
    fn rules(&self) -> Result<RuleSet> {
        let mut rules = RuleSet::new();
        rules.insert(
            "no-deprecated-classes".to_string(),
            Box::new(
                classes()
                    .should(ClassCondition::not_be_annotated_with("Deprecated"))
                    .with_priority(Priority::Medium),
            ),
        );
        rules.insert(
            "no-classes-in-deprecated-packages".to_string(),
            Box::new(
                classes()
                    .should(ClassCondition::not_reside_in_package_annotated_with("Deprecated"))
                    .with_priority(Priority::Low),
            ),
        );
        Ok(rules)
    }
}

/// Rules about the shape of the dependency graph.
#[derive(Debug, Default)]
pub struct DependencyRules;

impl RuleProvider for DependencyRules {
    fn rules(&self) -> Result<RuleSet> {
        let mut rules = RuleSet::new();
        rules.insert(
            "no-dependency-cycles".to_string(),
            Box::new(
                classes()
                    .should(ClassCondition::not_be_in_dependency_cycle())
                    .with_priority(Priority::Medium),
            ),
        );
        Ok(rules)
    }
}

/// The catalog of built-in providers.
pub fn registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry
        .register::<DeprecationRules>()
        .register::<DependencyRules>();
    registry
}
