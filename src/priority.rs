//! Rule priority levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ArchRulesError;

/// Ordered severity of a rule. `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// The canonical upper-case label (`LOW`, `MEDIUM`, `HIGH`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }

    /// Returns whether this priority is at or above `threshold`.
    ///
    /// A missing threshold admits every priority.
    ///
    /// ```
    /// use archrules_core::Priority;
    ///
    /// assert!(Priority::High.meets_threshold(Some(Priority::Medium)));
    /// assert!(!Priority::Low.meets_threshold(Some(Priority::Medium)));
    /// assert!(Priority::Low.meets_threshold(None));
    /// ```
    #[must_use]
    pub fn meets_threshold(self, threshold: Option<Priority>) -> bool {
        threshold.is_none_or(|t| self >= t)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ArchRulesError;

    /// Parses a priority. Matching is case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Priority::ALL.iter().map(|p| p.as_str()).collect();
                ArchRulesError::invalid_input_with_arg(
                    format!(
                        "Must be one of the following (case-sensitive): {}",
                        valid.join(", ")
                    ),
                    s,
                )
            })
    }
}
