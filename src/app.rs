//! Command dispatch for the `archrules` binary.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};

use crate::builtin;
use crate::cli::{Cli, Commands, ManifestArgs};
use crate::config::{
    load_config, merge_all_args, merge_check_args, merge_console_report_args, merge_enforce_args,
    merge_json_report_args, ArchRulesConfig, CheckSettings, ConsoleSettings, DataSettings,
    EnforceSettings, JsonSettings,
};
use crate::console_report::build_console_report;
use crate::enforce::enforce;
use crate::graph::JsonClassImporter;
use crate::json_report::write_json_report;
use crate::model::RuleResult;
use crate::registry::{ProviderManifest, ProviderRegistry};
use crate::runner::BatchRunner;
use crate::sink::{data_file_for, data_files_in, read_data_files, write_results};

/// Runs the parsed command line with the built-in provider catalog.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    run_with_registry(cli, builtin::registry())
}

/// Runs the parsed command line against `registry`.
pub fn run_with_registry(cli: Cli, registry: ProviderRegistry) -> anyhow::Result<()> {
    let config = match load_config(cli.config.as_deref())? {
        Some((path, config)) => {
            tracing::debug!("Loaded configuration from {}", path.display());
            config
        }
        None => ArchRulesConfig::default(),
    };

    match &cli.command {
        Commands::Check(args) => {
            check(&merge_check_args(args, &config), registry)?;
        }
        Commands::ConsoleReport(args) => {
            console_report(&merge_console_report_args(args, &config, cli.verbose))?;
        }
        Commands::JsonReport(args) => json_report(&merge_json_report_args(args, &config))?,
        Commands::Enforce(args) => enforce_results(&merge_enforce_args(args, &config))?,
        Commands::Manifest(args) => manifest(args, &registry)?,
        Commands::All(args) => {
            let settings = merge_all_args(args, &config, cli.verbose);
            check(&settings.check, registry)?;
            json_report(&settings.json)?;
            if let Some(console) = &settings.console {
                console_report(console)?;
            }
            enforce_results(&settings.enforce)?;
        }
    }
    Ok(())
}

/// Evaluates every source set and writes one data file per set.
fn check(settings: &CheckSettings, registry: ProviderRegistry) -> anyhow::Result<Vec<PathBuf>> {
    if settings.source_sets.is_empty() {
        bail!(
            "no source sets to check; pass --source-set NAME=PATH or configure [check.source_sets]"
        );
    }

    let registry = match &settings.manifest {
        Some(path) => {
            let manifest = ProviderManifest::load(path)?;
            registry
                .select(&manifest)
                .with_context(|| format!("failed to apply provider manifest {}", path.display()))?
        }
        None => registry,
    };
    let runner =
        BatchRunner::new(registry, JsonClassImporter::new()).with_overrides(settings.overrides.clone());

    let mut written = Vec::with_capacity(settings.source_sets.len());
    for (name, locations) in &settings.source_sets {
        tracing::info!(source_set = %name, "Checking source set");
        let results = runner
            .run(locations)
            .with_context(|| format!("failed to check source set '{name}'"))?;
        let path = data_file_for(&settings.data_dir, name);
        write_results(&path, &results)
            .with_context(|| format!("failed to persist results of source set '{name}'"))?;
        written.push(path);
    }
    Ok(written)
}

fn load_results(data: &DataSettings) -> anyhow::Result<Vec<RuleResult>> {
    let files = if data.data_files.is_empty() {
        data_files_in(&data.data_dir)?
    } else {
        data.data_files.clone()
    };
    if files.is_empty() {
        tracing::warn!("No result data found in {}", data.data_dir.display());
    }
    Ok(read_data_files(&files)?)
}

fn console_report(settings: &ConsoleSettings) -> anyhow::Result<()> {
    let results = load_results(&settings.data)?;
    build_console_report(&results, &settings.options).print();
    Ok(())
}

fn json_report(settings: &JsonSettings) -> anyhow::Result<()> {
    let results = load_results(&settings.data)?;
    write_json_report(&settings.output, &results)
        .with_context(|| format!("failed to write JSON report {}", settings.output.display()))?;
    Ok(())
}

fn enforce_results(settings: &EnforceSettings) -> anyhow::Result<()> {
    let results = load_results(&settings.data)?;
    enforce(&results, &settings.options)?;
    Ok(())
}

fn manifest(args: &ManifestArgs, registry: &ProviderRegistry) -> anyhow::Result<()> {
    let manifest = registry.manifest();
    match &args.output {
        Some(path) => write_manifest(&manifest, path)?,
        None => println!("{}", manifest.render()),
    }
    Ok(())
}

fn write_manifest(manifest: &ProviderManifest, path: &Path) -> anyhow::Result<()> {
    manifest
        .write(path)
        .with_context(|| format!("failed to write provider manifest {}", path.display()))
}
