//! Error types for archrules.
//!
//! This module defines the crate-wide error type. Each variant corresponds to
//! one class of fault the engine can hit: importing the code graph,
//! discovering rule providers, evaluating a rule, reading or writing result
//! data, loading configuration, and the enforcement gate tripping.
//!
//! Note that a rule whose selection matched nothing is *not* an error; it is
//! classified as a no-match outcome by the [`evaluator`](crate::evaluator).

use std::fmt;
use std::io;
use std::path::PathBuf;

/// The main error type for archrules operations.
#[derive(Debug)]
pub enum ArchRulesError {
    /// The code graph could not be imported from the given locations.
    ImportError {
        /// The location being imported, if known.
        location: Option<PathBuf>,
        /// What went wrong.
        context: String,
        /// The underlying error.
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A rule provider could not be discovered or failed to supply its rules.
    DiscoveryError {
        /// The provider identifier.
        provider: String,
        /// What went wrong.
        message: String,
        /// The underlying error.
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A rule faulted during evaluation for a reason other than an empty selection.
    EvaluationError {
        /// The rule that faulted.
        rule: String,
        /// What went wrong.
        message: String,
        /// The underlying error.
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An error occurred during file system operations.
    IoError {
        /// The operation being performed.
        operation: String,
        /// The path involved in the error.
        path: Option<PathBuf>,
        /// The underlying IO error.
        source: Option<io::Error>,
    },

    /// A result data file or report could not be encoded or decoded.
    DataFormatError {
        /// The file involved, if any.
        path: Option<PathBuf>,
        /// What went wrong.
        message: String,
        /// The underlying error.
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An error occurred while loading or parsing configuration.
    ConfigError {
        /// Description of the configuration issue.
        message: String,
        /// The config file path, if applicable.
        path: Option<PathBuf>,
        /// The underlying error.
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Rule failures met the configured failure threshold.
    EnforcementError {
        /// One `ruleName (PRIORITY)` line per offending result.
        failures: Vec<String>,
    },

    /// An error indicating an invalid argument or input.
    InvalidInput {
        /// Description of the invalid input.
        message: String,
        /// The argument or value that was invalid.
        argument: Option<String>,
    },
}

impl ArchRulesError {
    /// Creates a new `ImportError` with the given context.
    pub fn import_error(context: impl Into<String>) -> Self {
        Self::ImportError {
            location: None,
            context: context.into(),
            source: None,
        }
    }

    /// Creates a new `ImportError` for a specific location.
    pub fn import_error_at(location: PathBuf, context: impl Into<String>) -> Self {
        Self::ImportError {
            location: Some(location),
            context: context.into(),
            source: None,
        }
    }

    /// Creates a new `DiscoveryError` for the given provider.
    ///
    /// # Examples
    /// ```
    /// use archrules_core::error::ArchRulesError;
    ///
    /// let err = ArchRulesError::discovery_error("acme::Rules", "not in catalog");
    /// assert!(err.to_string().contains("acme::Rules"));
    /// ```
    pub fn discovery_error(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DiscoveryError {
            provider: provider.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `EvaluationError` for the given rule.
    pub fn evaluation_error(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EvaluationError {
            rule: rule.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `IoError` with the given operation description.
    pub fn io_error(operation: impl Into<String>) -> Self {
        Self::IoError {
            operation: operation.into(),
            path: None,
            source: None,
        }
    }

    /// Creates a new `IoError` with a path and underlying error.
    pub fn io_error_with_source(
        operation: impl Into<String>,
        path: PathBuf,
        source: io::Error,
    ) -> Self {
        Self::IoError {
            operation: operation.into(),
            path: Some(path),
            source: Some(source),
        }
    }

    /// Creates a new `DataFormatError` with the given message.
    pub fn data_format_error(message: impl Into<String>) -> Self {
        Self::DataFormatError {
            path: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `DataFormatError` for a specific file.
    pub fn data_format_error_in(path: PathBuf, message: impl Into<String>) -> Self {
        Self::DataFormatError {
            path: Some(path),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `ConfigError` with the given message.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Creates a new `ConfigError` with a file path.
    pub fn config_error_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::ConfigError {
            message: message.into(),
            path: Some(path),
            source: None,
        }
    }

    /// Creates a new `InvalidInput` error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            argument: None,
        }
    }

    /// Creates a new `InvalidInput` error with an argument name.
    pub fn invalid_input_with_arg(message: impl Into<String>, argument: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            argument: Some(argument.into()),
        }
    }

    /// Attaches a location to an `ImportError`; other variants are returned unchanged.
    #[must_use]
    pub fn at_location(self, at: PathBuf) -> Self {
        match self {
            Self::ImportError {
                context, source, ..
            } => Self::ImportError {
                location: Some(at),
                context,
                source,
            },
            Self::DataFormatError {
                message, source, ..
            } => Self::DataFormatError {
                path: Some(at),
                message,
                source,
            },
            other => other,
        }
    }

    /// Returns the name of the error variant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ImportError { .. } => "ImportError",
            Self::DiscoveryError { .. } => "DiscoveryError",
            Self::EvaluationError { .. } => "EvaluationError",
            Self::IoError { .. } => "IoError",
            Self::DataFormatError { .. } => "DataFormatError",
            Self::ConfigError { .. } => "ConfigError",
            Self::EnforcementError { .. } => "EnforcementError",
            Self::InvalidInput { .. } => "InvalidInput",
        }
    }

    /// Returns suggested recovery actions for the error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ImportError { location, .. } => {
                let mut s = vec![
                    "Check that the class locations exist and were produced by a compile step"
                        .to_string(),
                    "Ensure every class manifest is valid JSON".to_string(),
                ];
                if location.is_some() {
                    s.push("Regenerate the class manifest at the reported location".to_string());
                }
                s
            }
            Self::DiscoveryError { provider, .. } => vec![
                format!("Ensure the provider '{}' is registered in the catalog", provider),
                "Regenerate the provider manifest with `archrules manifest`".to_string(),
            ],
            Self::EvaluationError { rule, .. } => vec![
                format!("Review the definition of rule '{}'", rule),
                "Check that the imported code graph is complete".to_string(),
            ],
            Self::IoError { operation, .. } => {
                let mut s = vec![
                    "Check that the path exists and is accessible".to_string(),
                    "Verify you have the necessary permissions".to_string(),
                ];
                if operation.contains("write") || operation.contains("rename") {
                    s.push("Ensure there is free space in the output directory".to_string());
                }
                s
            }
            Self::DataFormatError { .. } => vec![
                "Re-run `archrules check` to regenerate the result data".to_string(),
                "Treat partially written data files as invalid and delete them".to_string(),
            ],
            Self::ConfigError { .. } => vec![
                "Check the configuration file syntax".to_string(),
                "Ensure the file is valid TOML format".to_string(),
                "Priorities are case-sensitive: LOW, MEDIUM or HIGH".to_string(),
            ],
            Self::EnforcementError { .. } => vec![
                "Fix the reported rule violations".to_string(),
                "Raise `enforce.failure_threshold` or override rule priorities".to_string(),
            ],
            Self::InvalidInput { .. } => vec![
                "Review the command-line arguments".to_string(),
                "Verify all required arguments are provided".to_string(),
            ],
        }
    }
}

impl fmt::Display for ArchRulesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImportError {
                location, context, ..
            } => {
                if let Some(location) = location {
                    write!(
                        f,
                        "Failed to import code graph from '{}': {}",
                        location.display(),
                        context
                    )
                } else {
                    write!(f, "Failed to import code graph: {}", context)
                }
            }
            Self::DiscoveryError {
                provider, message, ..
            } => {
                write!(f, "Rule provider '{}' could not be loaded: {}", provider, message)
            }
            Self::EvaluationError { rule, message, .. } => {
                write!(f, "Evaluation error in rule '{}': {}", rule, message)
            }
            Self::IoError {
                operation, path, ..
            } => {
                if let Some(p) = path {
                    write!(
                        f,
                        "IO error during '{}' at '{}': operation failed",
                        operation,
                        p.display()
                    )
                } else {
                    write!(f, "IO error during '{}': operation failed", operation)
                }
            }
            Self::DataFormatError { path, message, .. } => {
                if let Some(p) = path {
                    write!(f, "Invalid result data in '{}': {}", p.display(), message)
                } else {
                    write!(f, "Invalid result data: {}", message)
                }
            }
            Self::ConfigError { message, path, .. } => {
                if let Some(p) = path {
                    write!(f, "Configuration error in '{}': {}", p.display(), message)
                } else {
                    write!(f, "Configuration error: {}", message)
                }
            }
            Self::EnforcementError { failures } => {
                write!(f, "ArchRules failed: {}", failures.join("\n"))
            }
            Self::InvalidInput { message, argument } => {
                if let Some(arg) = argument {
                    write!(f, "Invalid input '{}': {}", arg, message)
                } else {
                    write!(f, "Invalid input: {}", message)
                }
            }
        }
    }
}

impl std::error::Error for ArchRulesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImportError { source, .. } => source.as_ref().map(|s| s.as_ref() as _),
            Self::DiscoveryError { source, .. } => source.as_ref().map(|s| s.as_ref() as _),
            Self::EvaluationError { source, .. } => source.as_ref().map(|s| s.as_ref() as _),
            Self::IoError { source, .. } => source.as_ref().map(|e| e as _),
            Self::DataFormatError { source, .. } => source.as_ref().map(|s| s.as_ref() as _),
            Self::ConfigError { source, .. } => source.as_ref().map(|s| s.as_ref() as _),
            Self::EnforcementError { .. } | Self::InvalidInput { .. } => None,
        }
    }
}

impl From<io::Error> for ArchRulesError {
    fn from(err: io::Error) -> Self {
        Self::IoError {
            operation: "file operation".to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<toml::de::Error> for ArchRulesError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML: {}", err),
            path: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for ArchRulesError {
    fn from(err: serde_json::Error) -> Self {
        Self::DataFormatError {
            path: None,
            message: format!("Failed to parse/serialize JSON: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

impl From<bincode::Error> for ArchRulesError {
    fn from(err: bincode::Error) -> Self {
        Self::DataFormatError {
            path: None,
            message: format!("Failed to encode/decode result record: {}", err),
            source: Some(err),
        }
    }
}

impl From<walkdir::Error> for ArchRulesError {
    fn from(err: walkdir::Error) -> Self {
        Self::ImportError {
            location: err.path().map(PathBuf::from),
            context: "directory traversal failed".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// A type alias for `Result<T, ArchRulesError>`.
pub type Result<T> = std::result::Result<T, ArchRulesError>;
