//! Configuration file support for archrules.
//!
//! This module loads configuration from TOML files and merges it with
//! command-line arguments. CLI arguments take precedence over config file
//! values, which take precedence over defaults.
//!
//! ```toml
//! [general]
//! verbose = false
//! data_dir = "build/reports/archrules"
//!
//! [check]
//! skip_source_sets = ["integration"]
//!
//! [check.source_sets]
//! main = ["build/classes/main"]
//! test = ["build/classes/test"]
//!
//! [priority_overrides]
//! "com.acme.rules" = "HIGH"
//!
//! [report]
//! skip_passing_summaries = true
//! console_details_threshold = "MEDIUM"
//!
//! [enforce]
//! failure_threshold = "MEDIUM"
//! fail_on_no_match = false
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::{AllArgs, CheckArgs, ConsoleReportArgs, DataArgs, EnforceArgs, JsonReportArgs};
use crate::console_report::ConsoleReportOptions;
use crate::enforce::EnforceOptions;
use crate::error::{ArchRulesError, Result};
use crate::priority::Priority;
use crate::runner::PriorityOverrides;

/// Default configuration file names to search for.
const DEFAULT_CONFIG_FILES: &[&str] = &["ArchRules.toml", ".archrules.toml", "archrules.toml"];

/// Default directory for result data files and reports.
pub const DEFAULT_DATA_DIR: &str = "build/reports/archrules";

/// File name of the JSON report inside the data directory.
pub const DEFAULT_JSON_REPORT: &str = "report.json";

/// Main configuration structure representing an archrules configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ArchRulesConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub check: CheckConfig,

    /// Provider-name prefix to overriding priority.
    #[serde(default)]
    pub priority_overrides: BTreeMap<String, Priority>,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub enforce: EnforceConfig,
}

/// General configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Reveal every rule in console reports and log at debug level.
    #[serde(default)]
    pub verbose: bool,

    /// Directory for result data files.
    pub data_dir: Option<PathBuf>,
}

/// Rule run configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    /// Source set name to class manifest locations.
    #[serde(default)]
    pub source_sets: BTreeMap<String, Vec<PathBuf>>,

    /// Source sets that are never checked.
    #[serde(default)]
    pub skip_source_sets: Vec<String>,

    /// Restrict the run to the providers listed in this manifest.
    pub manifest: Option<PathBuf>,
}

/// Report configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default = "default_true")]
    pub console_enabled: bool,

    #[serde(default)]
    pub skip_passing_summaries: bool,

    /// Lowest priority whose details are printed.
    #[serde(default = "default_details_threshold")]
    pub console_details_threshold: Option<Priority>,

    /// JSON report location; defaults to `report.json` in the data directory.
    pub json_output: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            console_enabled: true,
            skip_passing_summaries: false,
            console_details_threshold: default_details_threshold(),
            json_output: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_details_threshold() -> Option<Priority> {
    Some(Priority::Medium)
}

/// Enforcement gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EnforceConfig {
    /// Set to false to turn the gate off entirely.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Lowest priority whose failures fail the gate.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: Option<Priority>,

    #[serde(default)]
    pub fail_on_no_match: bool,
}

impl Default for EnforceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: default_failure_threshold(),
            fail_on_no_match: false,
        }
    }
}

fn default_failure_threshold() -> Option<Priority> {
    Some(Priority::Low)
}

/// Load configuration from a specific file path.
///
/// Returns `Ok(None)` if the file doesn't exist and an error if it exists
/// but cannot be parsed.
pub fn load_config_from_path(path: &Path) -> Result<Option<ArchRulesConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ArchRulesError::io_error_with_source("read config file", path.to_path_buf(), e))?;

    let config: ArchRulesConfig = toml::from_str(&content).map_err(|e| ArchRulesError::ConfigError {
        message: format!("Failed to parse TOML: {}", e),
        path: Some(path.to_path_buf()),
        source: Some(Box::new(e)),
    })?;

    Ok(Some(config))
}

/// Discover and load configuration from default locations.
///
/// Searches the current directory and its parents for `ArchRules.toml`,
/// `.archrules.toml` or `archrules.toml`.
pub fn discover_and_load_config() -> Result<Option<(PathBuf, ArchRulesConfig)>> {
    let mut current_dir = std::env::current_dir()?;

    loop {
        for config_name in DEFAULT_CONFIG_FILES {
            let config_path = current_dir.join(config_name);
            if let Some(config) = load_config_from_path(&config_path)? {
                return Ok(Some((config_path, config)));
            }
        }

        if !current_dir.pop() {
            break;
        }
    }

    Ok(None)
}

/// Load configuration from a specified path or discover it from default locations.
///
/// An explicitly given path that does not exist is an error.
pub fn load_config(config_path: Option<&Path>) -> Result<Option<(PathBuf, ArchRulesConfig)>> {
    match config_path {
        Some(path) => match load_config_from_path(path)? {
            Some(config) => Ok(Some((path.to_path_buf(), config))),
            None => Err(ArchRulesError::config_error_with_path(
                "Configuration file not found",
                path.to_path_buf(),
            )),
        },
        None => discover_and_load_config(),
    }
}

/// Fully resolved settings for a rule run.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckSettings {
    pub source_sets: BTreeMap<String, Vec<PathBuf>>,
    pub manifest: Option<PathBuf>,
    pub overrides: PriorityOverrides,
    pub data_dir: PathBuf,
}

/// Where report stages read their results from.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub data_dir: PathBuf,
    /// Explicit data files; when empty, every data file of `data_dir` is read.
    pub data_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleSettings {
    pub data: DataSettings,
    pub options: ConsoleReportOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonSettings {
    pub data: DataSettings,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnforceSettings {
    pub data: DataSettings,
    pub options: EnforceOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllSettings {
    pub check: CheckSettings,
    pub json: JsonSettings,
    pub console: Option<ConsoleSettings>,
    pub enforce: EnforceSettings,
}

fn resolve_data_dir(cli: &Option<PathBuf>, config: &ArchRulesConfig) -> PathBuf {
    cli.clone()
        .or_else(|| config.general.data_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

fn merge_data_args(args: &DataArgs, config: &ArchRulesConfig) -> DataSettings {
    DataSettings {
        data_dir: resolve_data_dir(&args.data_dir, config),
        data_files: args.data_files.clone(),
    }
}

/// Merge check CLI args with config file values.
///
/// Source sets given on the command line replace the configured ones.
/// Overrides given on the command line are applied on top of the configured ones.
pub fn merge_check_args(args: &CheckArgs, config: &ArchRulesConfig) -> CheckSettings {
    let mut source_sets: BTreeMap<String, Vec<PathBuf>> = if args.source_sets.is_empty() {
        config.check.source_sets.clone()
    } else {
        args.source_sets
            .iter()
            .map(|s| (s.name.clone(), s.locations.clone()))
            .collect()
    };
    for skipped in config.check.skip_source_sets.iter().chain(&args.skip_source_sets) {
        if source_sets.remove(skipped).is_some() {
            tracing::debug!(source_set = %skipped, "Skipping source set");
        }
    }

    let mut overrides: PriorityOverrides = config
        .priority_overrides
        .iter()
        .map(|(prefix, priority)| (prefix.clone(), *priority))
        .collect();
    for (prefix, priority) in PriorityOverrides::parse(args.overrides.iter().map(String::as_str)).iter() {
        overrides.insert(prefix, priority);
    }

    CheckSettings {
        source_sets,
        manifest: args.manifest.clone().or_else(|| config.check.manifest.clone()),
        overrides,
        data_dir: resolve_data_dir(&args.data_dir, config),
    }
}

/// Merge console report CLI args with config file values.
pub fn merge_console_report_args(
    args: &ConsoleReportArgs,
    config: &ArchRulesConfig,
    verbose: bool,
) -> ConsoleSettings {
    ConsoleSettings {
        data: merge_data_args(&args.data, config),
        options: ConsoleReportOptions {
            skip_passing_summaries: args.skip_passing || config.report.skip_passing_summaries,
            verbose: verbose || config.general.verbose,
            details_threshold: args
                .details_threshold
                .or(config.report.console_details_threshold),
        },
    }
}

/// Merge JSON report CLI args with config file values.
pub fn merge_json_report_args(args: &JsonReportArgs, config: &ArchRulesConfig) -> JsonSettings {
    let data = merge_data_args(&args.data, config);
    let output = args
        .output
        .clone()
        .or_else(|| config.report.json_output.clone())
        .unwrap_or_else(|| data.data_dir.join(DEFAULT_JSON_REPORT));
    JsonSettings { data, output }
}

fn failure_threshold(cli: Option<Priority>, config: &ArchRulesConfig) -> Option<Priority> {
    if !config.enforce.enabled {
        return None;
    }
    cli.or(config.enforce.failure_threshold)
}

/// Merge enforce CLI args with config file values.
pub fn merge_enforce_args(args: &EnforceArgs, config: &ArchRulesConfig) -> EnforceSettings {
    EnforceSettings {
        data: merge_data_args(&args.data, config),
        options: EnforceOptions {
            failure_threshold: failure_threshold(args.failure_threshold, config),
            fail_on_no_match: args.fail_on_no_match || config.enforce.fail_on_no_match,
        },
    }
}

/// Merge the arguments of the `all` command.
///
/// Every stage reads exactly the data files the check stage writes.
pub fn merge_all_args(args: &AllArgs, config: &ArchRulesConfig, verbose: bool) -> AllSettings {
    let check = merge_check_args(&args.check, config);
    let data = DataSettings {
        data_dir: check.data_dir.clone(),
        data_files: check
            .source_sets
            .keys()
            .map(|name| crate::sink::data_file_for(&check.data_dir, name))
            .collect(),
    };
    let output = args
        .output
        .clone()
        .or_else(|| config.report.json_output.clone())
        .unwrap_or_else(|| check.data_dir.join(DEFAULT_JSON_REPORT));
    let console = config.report.console_enabled.then(|| ConsoleSettings {
        data: data.clone(),
        options: ConsoleReportOptions {
            skip_passing_summaries: args.skip_passing || config.report.skip_passing_summaries,
            verbose: verbose || config.general.verbose,
            details_threshold: args
                .details_threshold
                .or(config.report.console_details_threshold),
        },
    });
    AllSettings {
        json: JsonSettings {
            data: data.clone(),
            output,
        },
        console,
        enforce: EnforceSettings {
            data,
            options: EnforceOptions {
                failure_threshold: failure_threshold(args.failure_threshold, config),
                fail_on_no_match: args.fail_on_no_match || config.enforce.fail_on_no_match,
            },
        },
        check,
    }
}
