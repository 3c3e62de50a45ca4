//! Result data files.
//!
//! A run's results are persisted so the report stages can be re-run without
//! re-evaluating any rule. Each file holds one ordered list of
//! [`RuleResult`]s in a versioned, self-delimiting layout:
//!
//! ```text
//! "ARRS"                magic
//! u16 LE                format version (1)
//! u32 LE                record count
//! { u32 LE, [u8; n] }*  record length, then the bincode-encoded record
//! ```
//!
//! Writers go through a sibling temporary file that is renamed into place,
//! so a failed write never leaves a partial file at the final path.
//!
//! # Example
//!
//! ```rust
//! use archrules_core::model::{Rule, RuleResult};
//! use archrules_core::sink::{decode_results, encode_results};
//! use archrules_core::Priority;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rule = Rule::new("acme.Rules", "no-cycles", "classes should be acyclic", Priority::Medium);
//! let results = vec![RuleResult::pass(rule)];
//!
//! let mut bytes = Vec::new();
//! encode_results(&mut bytes, &results)?;
//! assert_eq!(decode_results(&mut bytes.as_slice())?, results);
//! # Ok(())
//! # }
//! ```

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{ArchRulesError, Result};
use crate::model::RuleResult;

/// Leading bytes of every result data file.
pub const MAGIC: &[u8; 4] = b"ARRS";

/// Current format version.
pub const FORMAT_VERSION: u16 = 1;

/// Extension of result data files inside a data directory.
pub const DATA_FILE_EXTENSION: &str = "data";

/// Largest record accepted by the reader.
const MAX_RECORD_LEN: u32 = 16 * 1024 * 1024;

/// Writes `results` to `writer` in the data file layout.
///
/// # Errors
///
/// Returns an error if a record cannot be encoded or the writer fails.
pub fn encode_results<W: Write>(writer: &mut W, results: &[RuleResult]) -> Result<()> {
    let count = u32::try_from(results.len())
        .map_err(|_| ArchRulesError::data_format_error("too many results for one data file"))?;
    writer.write_all(MAGIC)?;
    writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
    writer.write_all(&count.to_le_bytes())?;
    for result in results {
        let record = bincode::serialize(result)?;
        let len = u32::try_from(record.len())
            .map_err(|_| ArchRulesError::data_format_error("result record too large"))?;
        writer.write_all(&len.to_le_bytes())?;
        writer.write_all(&record)?;
    }
    Ok(())
}

/// Reads a result list written by [`encode_results`].
///
/// # Errors
///
/// Returns a [`ArchRulesError::DataFormatError`] for a wrong magic, an
/// unknown version, a truncated stream, an undecodable record or bytes
/// following the last record.
pub fn decode_results<R: Read>(reader: &mut R) -> Result<Vec<RuleResult>> {
    let mut magic = [0u8; 4];
    read_exact(reader, &mut magic, "header")?;
    if &magic != MAGIC {
        return Err(ArchRulesError::data_format_error(
            "not an archrules data file (bad magic)",
        ));
    }

    let mut version = [0u8; 2];
    read_exact(reader, &mut version, "header")?;
    let version = u16::from_le_bytes(version);
    if version != FORMAT_VERSION {
        return Err(ArchRulesError::data_format_error(format!(
            "unsupported data file version {} (expected {})",
            version, FORMAT_VERSION
        )));
    }

    let count = read_u32(reader, "record count")?;
    let mut results = Vec::with_capacity(count.min(1024) as usize);
    for index in 0..count {
        let len = read_u32(reader, "record length")?;
        if len > MAX_RECORD_LEN {
            return Err(ArchRulesError::data_format_error(format!(
                "record {} is {} bytes, larger than the {} byte limit",
                index, len, MAX_RECORD_LEN
            )));
        }
        let mut record = vec![0u8; len as usize];
        read_exact(reader, &mut record, "record")?;
        results.push(bincode::deserialize(&record)?);
    }

    let mut trailing = [0u8; 1];
    if reader.read(&mut trailing)? != 0 {
        return Err(ArchRulesError::data_format_error(format!(
            "unexpected data after the last of {} records",
            count
        )));
    }
    Ok(results)
}

fn read_u32<R: Read>(reader: &mut R, what: &str) -> Result<u32> {
    let mut bytes = [0u8; 4];
    read_exact(reader, &mut bytes, what)?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ArchRulesError::data_format_error(format!("truncated data file: incomplete {}", what))
        } else {
            ArchRulesError::from(e)
        }
    })
}

/// Persists `results` at `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the directory, the temporary file or the rename fails.
/// On error no file is left at `path`.
pub fn write_results(path: &Path, results: &[RuleResult]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            ArchRulesError::io_error_with_source("create data directory", parent.to_path_buf(), e)
        })?;
    }

    let tmp = temporary_path(path);
    let written = File::create(&tmp)
        .map_err(|e| ArchRulesError::io_error_with_source("create data file", tmp.clone(), e))
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            encode_results(&mut writer, results)?;
            writer.flush()?;
            Ok(())
        })
        .map_err(|e| e.at_location(path.to_path_buf()));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        ArchRulesError::io_error_with_source("move data file into place", path.to_path_buf(), e)
    })?;
    tracing::debug!(path = %path.display(), results = results.len(), "Wrote result data");
    Ok(())
}

/// Reads one data file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or is not a valid data file.
pub fn read_results(path: &Path) -> Result<Vec<RuleResult>> {
    let file = File::open(path)
        .map_err(|e| ArchRulesError::io_error_with_source("open data file", path.to_path_buf(), e))?;
    decode_results(&mut BufReader::new(file)).map_err(|e| e.at_location(path.to_path_buf()))
}

/// Reads and concatenates several data files, in the given order.
///
/// Missing files are skipped with a warning; there is nothing to report for them.
///
/// # Errors
///
/// Returns an error for a file that exists but cannot be read or decoded.
pub fn read_data_files(paths: &[PathBuf]) -> Result<Vec<RuleResult>> {
    let mut results = Vec::new();
    for path in paths {
        if !path.exists() {
            tracing::warn!("Skipping missing data file {}", path.display());
            continue;
        }
        results.extend(read_results(path)?);
    }
    Ok(results)
}

/// Lists the `*.data` files of `dir`, sorted by name. A missing directory has none.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be walked.
pub fn data_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| ArchRulesError::IoError {
            operation: "list data directory".to_string(),
            path: Some(dir.to_path_buf()),
            source: e.into_io_error(),
        })?;
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == DATA_FILE_EXTENSION)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Path of the data file for a source set.
pub fn data_file_for(dir: &Path, source_set: &str) -> PathBuf {
    dir.join(format!("{}.{}", source_set, DATA_FILE_EXTENSION))
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
