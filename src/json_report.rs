//! Machine-readable JSON report.
//!
//! The report carries the full, unconsolidated result list, `PASS` and
//! `NO_MATCH` entries included.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ArchRulesError, Result};
use crate::model::RuleResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonReport {
    pub violations: Vec<RuleResult>,
}

impl JsonReport {
    pub fn new(results: &[RuleResult]) -> Self {
        Self {
            violations: results.to_vec(),
        }
    }
}

/// Renders `results` as a pretty-printed JSON document.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(results: &[RuleResult]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&JsonReport::new(results))?)
}

/// Writes the JSON report to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the report cannot be rendered or written.
pub fn write_json_report(path: &Path, results: &[RuleResult]) -> Result<()> {
    let json = render_json(results)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            ArchRulesError::io_error_with_source("create report directory", parent.to_path_buf(), e)
        })?;
    }
    fs::write(path, json)
        .map_err(|e| ArchRulesError::io_error_with_source("write JSON report", path.to_path_buf(), e))?;
    tracing::info!(path = %path.display(), results = results.len(), "Wrote JSON report");
    Ok(())
}
