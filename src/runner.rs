//! Batch runner: one evaluation run over every discovered rule.
//!
//! Providers are discovered first, so a broken provider aborts the run before
//! the (expensive) code graph import. The graph is then imported once and
//! shared read-only by every rule.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::Result;
use crate::evaluator::{evaluate, ConditionEvent, EvaluationOutcome, NO_MATCH_MESSAGE};
use crate::graph::{CodeGraph, CodeGraphImporter};
use crate::model::{Rule, RuleResult, RuleResultStatus};
use crate::priority::Priority;
use crate::registry::{DiscoveredProvider, ProviderRegistry};

/// Maps provider-name prefixes to an overriding priority.
///
/// When several prefixes match a provider, the longest one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorityOverrides {
    entries: BTreeMap<String, Priority>,
}

impl PriorityOverrides {
    /// An empty override table.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, prefix: impl Into<String>, priority: Priority) -> &mut Self {
        self.entries.insert(prefix.into(), priority);
        self
    }

    /// Parses `PREFIX=PRIORITY` entries.
    ///
    /// Malformed entries and unknown priorities are logged and skipped.
    pub fn parse<'a>(entries: impl IntoIterator<Item = &'a str>) -> Self {
        let mut overrides = Self::new();
        for entry in entries {
            let Some((prefix, priority)) = entry.split_once('=') else {
                tracing::warn!("Ignoring priority override '{}': expected PREFIX=PRIORITY", entry);
                continue;
            };
            match priority.trim().parse::<Priority>() {
                Ok(priority) => {
                    overrides.insert(prefix.trim(), priority);
                }
                Err(_) => tracing::warn!(
                    "Ignoring priority override '{}': valid priorities are {}",
                    entry,
                    Priority::ALL.map(Priority::as_str).join(", ")
                ),
            }
        }
        overrides
    }

    /// The priority of the longest prefix of `provider`, if any.
    pub fn resolve(&self, provider: &str) -> Option<Priority> {
        self.entries
            .iter()
            .filter(|(prefix, _)| provider.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, priority)| *priority)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Priority)> {
        self.entries.iter().map(|(prefix, priority)| (prefix.as_str(), *priority))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Priority)> for PriorityOverrides {
    fn from_iter<I: IntoIterator<Item = (String, Priority)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Runs every rule of every registered provider against one code graph.
pub struct BatchRunner<I> {
    registry: ProviderRegistry,
    importer: I,
    overrides: PriorityOverrides,
}

impl<I: CodeGraphImporter> BatchRunner<I> {
    /// Creates a runner without priority overrides.
    pub fn new(registry: ProviderRegistry, importer: I) -> Self {
        Self {
            registry,
            importer,
            overrides: PriorityOverrides::default(),
        }
    }

    /// Replaces the priority overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: PriorityOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Discovers providers, imports `locations` once and evaluates every rule.
    ///
    /// # Errors
    ///
    /// Discovery, import and unexpected evaluation faults abort the run.
    #[tracing::instrument(level = "debug", skip_all, fields(locations = locations.len()))]
    pub fn run(&self, locations: &[PathBuf]) -> Result<Vec<RuleResult>> {
        let providers = self.registry.discover()?;
        let graph = self.importer.import(locations)?;
        self.evaluate_all(&providers, &graph)
    }

    /// Evaluates every rule against an already imported graph.
    ///
    /// # Errors
    ///
    /// Discovery and unexpected evaluation faults abort the run.
    pub fn run_against(&self, graph: &CodeGraph) -> Result<Vec<RuleResult>> {
        let providers = self.registry.discover()?;
        self.evaluate_all(&providers, graph)
    }

    fn evaluate_all(
        &self,
        providers: &[DiscoveredProvider],
        graph: &CodeGraph,
    ) -> Result<Vec<RuleResult>> {
        let mut results = Vec::new();
        for provider in providers {
            let priority_override = self.overrides.resolve(&provider.name);
            for (id, rule) in &provider.rules {
                tracing::debug!(provider = %provider.name, rule = %id, "Evaluating rule");
                let outcome = evaluate(rule.as_ref(), graph)?;
                results.extend(to_results(&provider.name, id, outcome, priority_override));
            }
        }
        tracing::info!(
            results = results.len(),
            failures = results.iter().filter(|r| r.is_failure()).count(),
            "Evaluated rules"
        );
        Ok(results)
    }
}

fn to_results(
    provider: &str,
    id: &str,
    outcome: EvaluationOutcome,
    priority_override: Option<Priority>,
) -> Vec<RuleResult> {
    let rule = Rule::new(
        provider,
        id,
        outcome.description,
        priority_override.unwrap_or(outcome.priority),
    );
    if outcome.events.is_empty() {
        return vec![RuleResult::pass(rule)];
    }
    outcome
        .events
        .into_iter()
        .map(|event| {
            // The sentinel text marks a no-match even when a rule reports it as a violation.
            let status = match &event {
                ConditionEvent::NoClassesMatched => RuleResultStatus::NoMatch,
                ConditionEvent::Violated(message) if message == NO_MATCH_MESSAGE => {
                    RuleResultStatus::NoMatch
                }
                ConditionEvent::Violated(_) => RuleResultStatus::Fail,
            };
            RuleResult::new(rule.clone(), event.detail(), status)
        })
        .collect()
}
