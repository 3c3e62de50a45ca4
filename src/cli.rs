use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::priority::Priority;

/// CLI arguments for `archrules`.
#[derive(Parser, Debug)]
#[command(
    name = "archrules",
    version,
    about = "Evaluate architecture rules against compiled code and report the results"
)]
pub struct Cli {
    /// Path to a configuration file. Defaults to the first ArchRules.toml,
    /// .archrules.toml or archrules.toml found from the working directory up.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Reveal every rule in console reports and log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run every rule against each source set and persist the results.
    Check(CheckArgs),
    /// Print the console summary and details from persisted results.
    ConsoleReport(ConsoleReportArgs),
    /// Write the JSON report from persisted results.
    JsonReport(JsonReportArgs),
    /// Fail when persisted results contain failures at or above a priority.
    Enforce(EnforceArgs),
    /// Write the list of known rule providers.
    Manifest(ManifestArgs),
    /// Check, then write the JSON report, print the console report and enforce.
    All(AllArgs),
}

/// A named set of class manifest locations, given as `NAME=PATH[,PATH...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSetArg {
    pub name: String,
    pub locations: Vec<PathBuf>,
}

fn parse_source_set(value: &str) -> Result<SourceSetArg, String> {
    let (name, paths) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH[,PATH...], got '{value}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("source set name must not be empty".to_string());
    }
    let locations: Vec<PathBuf> = paths
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect();
    if locations.is_empty() {
        return Err(format!("source set '{name}' has no locations"));
    }
    Ok(SourceSetArg {
        name: name.to_string(),
        locations,
    })
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Source set to check, as NAME=PATH[,PATH...]. Replaces configured source sets.
    #[arg(long = "source-set", value_parser = parse_source_set)]
    pub source_sets: Vec<SourceSetArg>,

    /// Source set to skip. May be repeated.
    #[arg(long = "skip-source-set")]
    pub skip_source_sets: Vec<String>,

    /// Only run the providers listed in this manifest.
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Priority override, as PROVIDER_PREFIX=PRIORITY. May be repeated.
    #[arg(long = "override")]
    pub overrides: Vec<String>,

    /// Directory for result data files.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

/// Where report stages read persisted results from.
#[derive(Args, Debug, Clone, Default)]
pub struct DataArgs {
    /// Directory whose `*.data` files are read.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Explicit data file to read instead of the directory. May be repeated.
    #[arg(long = "data-file")]
    pub data_files: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ConsoleReportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Do not list rules without failures in the summary.
    #[arg(long)]
    pub skip_passing: bool,

    /// Lowest priority (LOW, MEDIUM, HIGH) whose details are printed.
    #[arg(long)]
    pub details_threshold: Option<Priority>,
}

#[derive(Args, Debug, Clone)]
pub struct JsonReportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Report location. Defaults to report.json in the data directory.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct EnforceArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Lowest priority (LOW, MEDIUM, HIGH) whose failures fail the gate.
    #[arg(long)]
    pub failure_threshold: Option<Priority>,

    /// Treat rules that matched no classes as failures.
    #[arg(long)]
    pub fail_on_no_match: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ManifestArgs {
    /// Manifest location. Printed to stdout when omitted.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct AllArgs {
    #[command(flatten)]
    pub check: CheckArgs,

    /// Do not list rules without failures in the summary.
    #[arg(long)]
    pub skip_passing: bool,

    /// Lowest priority whose details are printed.
    #[arg(long)]
    pub details_threshold: Option<Priority>,

    /// JSON report location.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Lowest priority whose failures fail the gate.
    #[arg(long)]
    pub failure_threshold: Option<Priority>,

    /// Treat rules that matched no classes as failures.
    #[arg(long)]
    pub fail_on_no_match: bool,
}
