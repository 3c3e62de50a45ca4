//! # archrules - architecture rule evaluation
//!
//! archrules is a CLI tool and library that evaluates declarative
//! architecture rules against the structural graph of a compiled codebase
//! and aggregates the outcome into pass/fail/no-match reports. It is meant
//! to run in a build pipeline as an architecture-conformance gate.
//!
//! ## Architecture
//!
//! - [`graph`] - The code graph and its importers
//! - [`rule`] - The [`ArchRule`](rule::ArchRule) trait and composite rules
//! - [`lang`] - A builder for "classes that X should Y" rules
//! - [`evaluator`] - Two-phase evaluation that classifies empty selections as no-match
//! - [`registry`] - Rule providers, the explicit provider registry and its manifest
//! - [`runner`] - Batch evaluation of every rule, with priority overrides
//! - [`sink`] - Versioned result data files
//! - [`consolidate`] - Grouping of results by rule
//! - [`console_report`] / [`json_report`] - Reporters
//! - [`enforce`] - The failure-threshold build gate
//! - [`builtin`] - Providers shipped with the binary
//! - [`config`] - Configuration file loading and merging
//! - [`error`] - Centralized error types for the crate
//!
//! ## Usage as a Library
//!
//! ```rust
//! use archrules_core::graph::{ClassNode, CodeGraph, JsonClassImporter};
//! use archrules_core::runner::BatchRunner;
//! use archrules_core::{builtin, consolidate};
//!
//! # fn main() -> archrules_core::Result<()> {
//! let graph = CodeGraph::new(
//!     vec![ClassNode::new("app.Old").with_annotation("Deprecated")],
//!     vec![],
//! );
//! let results = BatchRunner::new(builtin::registry(), JsonClassImporter::new())
//!     .run_against(&graph)?;
//!
//! for summary in consolidate::summaries(&results) {
//!     println!("{} {} ({} failures)", summary.rule_name, summary.priority, summary.failure_count);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All fallible library functions return [`Result<T>`], an alias for
//! `std::result::Result<T, ArchRulesError>`. See the [`error`] module.

pub mod app;
pub mod builtin;
pub mod cli;
pub mod config;
pub mod consolidate;
pub mod console_report;
pub mod enforce;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod json_report;
pub mod lang;
pub mod model;
pub mod priority;
pub mod registry;
pub mod rule;
pub mod runner;
pub mod sink;

// Public API exports
pub use crate::evaluator::{evaluate, EvaluationOutcome, NO_MATCH_MESSAGE};
pub use crate::model::{Rule, RuleResult, RuleResultStatus, RuleSummary};
pub use crate::priority::Priority;
pub use crate::registry::{ProviderRegistry, RuleProvider, RuleSet};
pub use crate::rule::{ArchRule, SelectionPolicy, Verdict};
pub use crate::runner::{BatchRunner, PriorityOverrides};

// Config exports
pub use crate::config::{load_config, load_config_from_path, ArchRulesConfig};

// Error exports
pub use crate::error::{ArchRulesError as Error, Result};
