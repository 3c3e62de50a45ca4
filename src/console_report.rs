//! Console summary and detail report.
//!
//! The summary is a table with one row per rule. The detail section lists
//! the reportable results of each rule. What is shown depends on
//! [`ConsoleReportOptions`]:
//!
//! - a rule is *revealed* when `verbose` is set or its priority meets
//!   `details_threshold`;
//! - passing rules are listed unless `skip_passing_summaries` is set;
//! - rules whose only result is a no-match are listed, and detailed, only
//!   when revealed;
//! - violation details are printed only for revealed rules.
//!
//! When anything was hidden and `verbose` is off, a single note is appended.

use prettytable::{format, Attr, Cell, Row, Table};

use crate::consolidate::{consolidate, RuleGroup};
use crate::model::RuleResult;
use crate::priority::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleReportOptions {
    pub skip_passing_summaries: bool,
    pub verbose: bool,
    pub details_threshold: Option<Priority>,
}

impl Default for ConsoleReportOptions {
    fn default() -> Self {
        Self {
            skip_passing_summaries: false,
            verbose: false,
            details_threshold: Some(Priority::Medium),
        }
    }
}

impl ConsoleReportOptions {
    fn reveals(&self, group: &RuleGroup) -> bool {
        self.verbose || group.rule.priority.meets_threshold(self.details_threshold)
    }
}

/// A rendered console report.
#[derive(Debug, Clone)]
pub struct ConsoleReport {
    pub summary: Option<Table>,
    pub details: String,
    pub notice: Option<String>,
}

impl ConsoleReport {
    /// The whole report as text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(summary) = &self.summary {
            out.push_str("ArchRules summary\n");
            out.push_str(&summary.to_string());
        }
        if !self.details.is_empty() {
            out.push('\n');
            out.push_str(&self.details);
        }
        if let Some(notice) = &self.notice {
            out.push_str(notice);
            out.push('\n');
        }
        out
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.details.is_empty() && self.notice.is_none()
    }
}

/// Builds the console report for a flat result list.
#[must_use]
pub fn build_console_report(results: &[RuleResult], options: &ConsoleReportOptions) -> ConsoleReport {
    let groups = consolidate(results);
    let mut table = summary_table();
    let mut rows = 0usize;
    let mut hidden = false;
    let mut details = String::new();

    for group in &groups {
        let revealed = options.reveals(group);
        let (status, style) = if group.failure_count() > 0 {
            (
                format!("{} failures", group.failure_count()),
                priority_color(group.rule.priority),
            )
        } else if !group.reportable.is_empty() {
            ("no match".to_string(), Attr::ForegroundColor(prettytable::color::YELLOW))
        } else {
            ("No failures".to_string(), Attr::ForegroundColor(prettytable::color::GREEN))
        };

        let listed = if group.failure_count() > 0 {
            true
        } else if !group.reportable.is_empty() {
            revealed
        } else {
            !options.skip_passing_summaries
        };
        if listed {
            table.add_row(Row::new(vec![
                Cell::new(&group.rule.rule_class),
                Cell::new(&group.rule.rule_name),
                Cell::new(group.rule.priority.as_str()).with_style(priority_color(group.rule.priority)),
                Cell::new(&status).with_style(style),
            ]));
            rows += 1;
        }

        if group.reportable.is_empty() {
            continue;
        }
        if !revealed {
            hidden = true;
            continue;
        }
        details.push_str(&format!(
            "Rule: {} Priority: {}\n{}\n",
            group.rule.rule_name, group.rule.priority, group.rule.description
        ));
        for result in &group.reportable {
            details.push_str("    ");
            details.push_str(&result.message);
            details.push('\n');
        }
        details.push('\n');
    }

    let notice = (hidden && !options.verbose).then(|| {
        format!(
            "Note: In order to see details of rules below {} priority, run with --verbose",
            options.details_threshold.unwrap_or(Priority::Low)
        )
    });

    ConsoleReport {
        summary: (rows > 0).then_some(table),
        details,
        notice,
    }
}

fn summary_table() -> Table {
    let mut table = Table::new();
    table.set_format(
        format::FormatBuilder::new()
            .separator(
                format::LinePosition::Top,
                format::LineSeparator::new('─', '┬', '┌', '┐'),
            )
            .separator(
                format::LinePosition::Title,
                format::LineSeparator::new('═', '╪', '╞', '╡'),
            )
            .separator(
                format::LinePosition::Bottom,
                format::LineSeparator::new('─', '┴', '└', '┘'),
            )
            .column_separator('│')
            .borders('│')
            .padding(1, 1)
            .build(),
    );
    table.set_titles(Row::new(vec![
        Cell::new("Provider").with_style(Attr::Bold),
        Cell::new("Rule").with_style(Attr::Bold),
        Cell::new("Priority").with_style(Attr::Bold),
        Cell::new("Result").with_style(Attr::Bold),
    ]));
    table
}

const fn priority_color(priority: Priority) -> Attr {
    match priority {
        Priority::Low => Attr::ForegroundColor(prettytable::color::WHITE),
        Priority::Medium => Attr::ForegroundColor(prettytable::color::YELLOW),
        Priority::High => Attr::ForegroundColor(prettytable::color::RED),
    }
}
