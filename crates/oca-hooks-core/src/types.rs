//! Core types for findings and run results.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Position of a finding inside a file.
///
/// Both coordinates are 1-indexed. A missing column means the rule only knows
/// the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed), if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl Location {
    /// Creates a location with a known line and column.
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            line,
            column: Some(column),
        }
    }

    /// Creates a location that only knows its line.
    #[must_use]
    pub fn line(line: u32) -> Self {
        Self { line, column: None }
    }
}

/// One reported rule violation.
///
/// Findings are created by rule routines (or by the engine itself for
/// resolution and internal errors) and never mutated afterwards, only
/// filtered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Rule identifier (e.g., "xml-duplicate-record-id").
    pub rule: String,
    /// File the finding is attached to.
    pub file: PathBuf,
    /// Position inside the file; `None` when unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Arguments substituted into the rule's message template.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Finding {
    /// Creates a finding without location or arguments.
    #[must_use]
    pub fn new(rule: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            rule: rule.into(),
            file: file.into(),
            location: None,
            args: Vec::new(),
        }
    }

    /// Sets the location of this finding.
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Sets the location from a line number only.
    #[must_use]
    pub fn at_line(self, line: u32) -> Self {
        self.at(Location::line(line))
    }

    /// Appends one message argument.
    #[must_use]
    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Returns the line, if known.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        self.location.map(|l| l.line)
    }

    /// Returns true if this finding belongs to `path`.
    #[must_use]
    pub fn is_for(&self, path: &Path) -> bool {
        self.file == path
    }

    /// Renders the message template of the finding's rule with its arguments.
    #[must_use]
    pub fn message(&self, template: &str) -> String {
        render_message(template, &self.args)
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (line, column) = match self.location {
            Some(Location { line, column }) => (
                line.to_string(),
                column.map(|c| c.to_string()).unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };
        write!(
            f,
            "{}:{}:{}: [{}]",
            self.file.display(),
            line,
            column,
            self.rule
        )?;
        if !self.args.is_empty() {
            write!(f, " {}", self.args.join(", "))?;
        }
        Ok(())
    }
}

/// Substitutes `{}` placeholders in `template` with `args`, in order.
///
/// Missing arguments render as empty strings; surplus arguments are ignored.
#[must_use]
pub fn render_message(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        if let Some(arg) = args.next() {
            out.push_str(arg);
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

/// Result of a completed run.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Final findings, after suppression and enable/disable filtering.
    pub findings: Vec<Finding>,
    /// Number of targets processed.
    pub targets_checked: usize,
    /// Number of findings dropped by inline suppression directives.
    pub suppressed: usize,
}

impl RunReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no findings remain.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Returns findings emitted under `rule`.
    #[must_use]
    pub fn by_rule(&self, rule: &str) -> Vec<&Finding> {
        self.findings.iter().filter(|f| f.rule == rule).collect()
    }

    /// Counts findings per rule identifier, sorted by identifier.
    #[must_use]
    pub fn count_by_rule(&self) -> std::collections::BTreeMap<&str, usize> {
        let mut counts = std::collections::BTreeMap::new();
        for finding in &self.findings {
            *counts.entry(finding.rule.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_finding() -> Finding {
        Finding::new("xml-syntax-error", "/repo/mod_a/views.xml")
    }

    #[test]
    fn render_message_substitutes_in_order() {
        let args = vec!["record".to_string(), "x.xml".to_string()];
        assert_eq!(
            render_message("Duplicate {} id in {}", &args),
            "Duplicate record id in x.xml"
        );
    }

    #[test]
    fn render_message_tolerates_missing_args() {
        assert_eq!(render_message("a {} b {}", &["1".to_string()]), "a 1 b ");
    }

    #[test]
    fn display_renders_unknown_location_empty() {
        let display = make_finding().to_string();
        assert_eq!(display, "/repo/mod_a/views.xml::: [xml-syntax-error]");
    }

    #[test]
    fn display_includes_line_and_column() {
        let display = make_finding()
            .at(Location::new(12, 4))
            .arg("t-esc-options")
            .to_string();
        assert_eq!(
            display,
            "/repo/mod_a/views.xml:12:4: [xml-syntax-error] t-esc-options"
        );
    }

    #[test]
    fn count_by_rule_groups_findings() {
        let mut report = RunReport::new();
        report.findings.push(make_finding());
        report.findings.push(make_finding().at_line(3));
        report
            .findings
            .push(Finding::new("missing-readme", "/repo/mod_a"));

        let counts = report.count_by_rule();
        assert_eq!(counts.get("xml-syntax-error"), Some(&2));
        assert_eq!(counts.get("missing-readme"), Some(&1));
        assert!(!report.is_clean());
    }
}
