//! End-to-end scenarios for a rule run and the report stages.
//!
//! Two providers are registered: one whose rule finds a deprecated class and
//! one whose rule selects a class that does not exist. The run is persisted,
//! read back and fed to the consolidator and both reporters.

use archrules_core::console_report::{build_console_report, ConsoleReportOptions};
use archrules_core::graph::{ClassNode, CodeGraph, CodeGraphImporter, JsonClassImporter};
use archrules_core::json_report::render_json;
use archrules_core::lang::{classes, ClassCondition, ClassPredicate};
use archrules_core::sink::{data_file_for, data_files_in, read_data_files, write_results};
use archrules_core::{
    consolidate, BatchRunner, Priority, PriorityOverrides, ProviderRegistry, Result, RuleProvider,
    RuleResultStatus, RuleSet, NO_MATCH_MESSAGE,
};
use std::fs;
use std::path::PathBuf;

#[derive(Default)]
struct NoDeprecatedProvider;

impl RuleProvider for NoDeprecatedProvider {
    fn rules(&self) -> Result<RuleSet> {
        let mut rules = RuleSet::new();
        rules.insert(
            "NoDeprecated".to_string(),
            Box::new(
                classes()
                    .should(ClassCondition::not_be_annotated_with("Deprecated"))
                    .with_priority(Priority::Medium),
            ),
        );
        Ok(rules)
    }
}

#[derive(Default)]
struct SmokeTestProvider;

impl RuleProvider for SmokeTestProvider {
    fn rules(&self) -> Result<RuleSet> {
        let mut rules = RuleSet::new();
        rules.insert(
            "SmokeTest".to_string(),
            Box::new(
                classes()
                    .that(ClassPredicate::simple_name("SmokeTest"))
                    .should(ClassCondition::be_annotated_with("Deprecated"))
                    .with_priority(Priority::Medium),
            ),
        );
        Ok(rules)
    }
}

struct InMemoryImporter(CodeGraph);

impl CodeGraphImporter for InMemoryImporter {
    fn import(&self, _locations: &[PathBuf]) -> Result<CodeGraph> {
        Ok(self.0.clone())
    }
}

fn two_class_codebase() -> CodeGraph {
    CodeGraph::new(
        vec![
            ClassNode::new("app.PassingClass"),
            ClassNode::new("app.FailingClass").with_annotation("Deprecated"),
        ],
        vec![],
    )
}

fn registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry
        .register_factory("p1.NoDeprecatedProvider", || Ok(Box::new(NoDeprecatedProvider)))
        .register_factory("com.acme.rules.impl.FooProvider", || {
            Ok(Box::new(SmokeTestProvider))
        });
    registry
}

fn run(overrides: PriorityOverrides) -> Vec<archrules_core::RuleResult> {
    BatchRunner::new(registry(), InMemoryImporter(two_class_codebase()))
        .with_overrides(overrides)
        .run(&[PathBuf::from("build/classes")])
        .expect("run should succeed")
}

#[test]
fn test_fail_and_no_match_scenario() {
    let results = run(PriorityOverrides::new());

    assert_eq!(results.len(), 2, "one FAIL and one NO_MATCH expected");
    let fail = &results[0];
    assert_eq!(fail.rule.rule_name, "NoDeprecated");
    assert_eq!(fail.status, RuleResultStatus::Fail);
    assert_eq!(
        fail.message,
        "Class <app.FailingClass> is annotated with @Deprecated"
    );
    let no_match = &results[1];
    assert_eq!(no_match.rule.rule_name, "SmokeTest");
    assert_eq!(no_match.status, RuleResultStatus::NoMatch);
    assert_eq!(no_match.message, NO_MATCH_MESSAGE);

    let summaries = consolidate::summaries(&results);
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].rule_name, "NoDeprecated");
    assert_eq!(summaries[0].failure_count, 1);
    assert_eq!(summaries[1].rule_name, "SmokeTest");
    assert_eq!(summaries[1].failure_count, 0);
}

#[test]
fn test_override_prefix_applies_to_provider_rules() {
    let mut overrides = PriorityOverrides::new();
    overrides.insert("com.acme.rules", Priority::High);
    let results = run(overrides);

    let smoke = results
        .iter()
        .find(|r| r.rule.rule_name == "SmokeTest")
        .expect("smoke result");
    assert_eq!(smoke.rule.priority, Priority::High);
    let deprecated = results
        .iter()
        .find(|r| r.rule.rule_name == "NoDeprecated")
        .expect("deprecated result");
    assert_eq!(deprecated.rule.priority, Priority::Medium);
}

#[test]
fn test_override_matching_nothing_keeps_declared_priorities() {
    let mut overrides = PriorityOverrides::new();
    overrides.insert("org.unrelated", Priority::Low);
    let results = run(overrides);
    assert!(results.iter().all(|r| r.rule.priority == Priority::Medium));
}

#[test]
fn test_json_report_contains_every_result() {
    let results = run(PriorityOverrides::new());
    let json: serde_json::Value =
        serde_json::from_str(&render_json(&results).expect("render")).expect("valid JSON");
    let statuses: Vec<_> = json["violations"]
        .as_array()
        .expect("violations array")
        .iter()
        .map(|v| v["status"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(statuses, vec!["FAIL", "NO_MATCH"]);
}

#[test]
fn test_console_skip_passing_keeps_revealed_no_match() {
    let results = run(PriorityOverrides::new());
    let options = ConsoleReportOptions {
        skip_passing_summaries: true,
        ..ConsoleReportOptions::default()
    };
    let output = build_console_report(&results, &options).render();
    assert!(output.contains("NoDeprecated"));
    assert!(output.contains("SmokeTest"), "MEDIUM no-match is revealed by default");

    let mut low = PriorityOverrides::new();
    low.insert("com.acme", Priority::Low);
    let results = run(low);
    let output = build_console_report(&results, &options).render();
    assert!(!output.contains("SmokeTest"), "LOW no-match hidden without --verbose");
    assert!(output.contains("--verbose"));

    let verbose = ConsoleReportOptions {
        verbose: true,
        ..options
    };
    let output = build_console_report(&results, &verbose).render();
    assert!(output.contains("SmokeTest"));
}

#[test]
fn test_no_match_in_one_source_set_only_is_not_reported() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let with_smoke = CodeGraph::new(
        vec![ClassNode::new("app.SmokeTest").with_annotation("Deprecated")],
        vec![],
    );
    let main = BatchRunner::new(registry(), InMemoryImporter(two_class_codebase()))
        .run(&[])
        .expect("main run");
    let test = BatchRunner::new(registry(), InMemoryImporter(with_smoke))
        .run(&[])
        .expect("test run");
    write_results(&data_file_for(dir.path(), "main"), &main).expect("write main");
    write_results(&data_file_for(dir.path(), "test"), &test).expect("write test");

    let files = data_files_in(dir.path()).expect("list data files");
    assert_eq!(files.len(), 2);
    let all = read_data_files(&files).expect("read data files");
    let smoke = consolidate::consolidate(&all)
        .into_iter()
        .find(|g| g.rule.rule_name == "SmokeTest")
        .expect("smoke group");
    assert!(smoke.reportable.is_empty());
    assert!(!smoke.is_no_match());
}

#[test]
fn test_json_importer_feeds_runner() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    fs::write(
        dir.path().join("main.json"),
        r#"{"classes": [{"name": "app.FailingClass", "annotations": ["Deprecated"]}]}"#,
    )
    .expect("write manifest");
    let results = BatchRunner::new(registry(), JsonClassImporter::new())
        .run(&[dir.path().to_path_buf()])
        .expect("run");
    assert_eq!(results[0].status, RuleResultStatus::Fail);

    let missing = BatchRunner::new(registry(), JsonClassImporter::new())
        .run(&[dir.path().join("missing")]);
    assert!(missing.is_err(), "import faults are fatal");
}
