//! Shared output formatting for run reports.

use anyhow::{Context, Result};
use oca_hooks_core::{Finding, RuleRegistry, RunReport, UnknownRule};
use std::io::IsTerminal;
use std::path::Path;

use crate::OutputFormat;

/// Print a run report in the specified format.
///
/// Paths under `base` are shown relative to it.
pub fn print(
    report: &RunReport,
    registry: &RuleRegistry,
    format: OutputFormat,
    base: &Path,
) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(report, registry, base),
        OutputFormat::Json => return print_json(report),
        OutputFormat::Compact => print_compact(report, registry, base),
    }
    Ok(())
}

/// Print configuration warnings to stderr, whatever the log level.
pub fn print_unknown(unknown: &[UnknownRule]) {
    for rule in unknown {
        eprintln!("{}", unknown_line(rule));
    }
}

fn unknown_line(rule: &UnknownRule) -> String {
    format!(
        "warning: unknown message '{}' in {} configuration has no effect",
        rule.id, rule.source
    )
}

fn print_text(report: &RunReport, registry: &RuleRegistry, base: &Path) {
    for finding in &report.findings {
        println!("{}", text_line(finding, registry, base));
    }

    let summary = format!(
        "Found {} finding(s) in {} target(s), {} suppressed",
        report.findings.len(),
        report.targets_checked,
        report.suppressed
    );
    if std::io::stdout().is_terminal() {
        let color = if report.is_clean() { "\x1b[32m" } else { "\x1b[31m" };
        println!("{color}{summary}\x1b[0m");
    } else {
        println!("{summary}");
    }
}

fn print_json(report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    println!("{json}");
    Ok(())
}

fn print_compact(report: &RunReport, registry: &RuleRegistry, base: &Path) {
    for finding in &report.findings {
        let line = finding.line().map(|l| l.to_string()).unwrap_or_default();
        println!(
            "{}:{} {} - [{}]",
            display_path(&finding.file, base),
            line,
            message(finding, registry),
            finding.rule,
        );
    }
}

/// `path:line:column: [rule-id] message`, unknown coordinates left empty.
fn text_line(finding: &Finding, registry: &RuleRegistry, base: &Path) -> String {
    let line = finding.line().map(|l| l.to_string()).unwrap_or_default();
    let column = finding
        .location
        .and_then(|l| l.column)
        .map(|c| c.to_string())
        .unwrap_or_default();
    format!(
        "{}:{line}:{column}: [{}] {}",
        display_path(&finding.file, base),
        finding.rule,
        message(finding, registry),
    )
}

fn message(finding: &Finding, registry: &RuleRegistry) -> String {
    registry
        .descriptor(&finding.rule)
        .map_or_else(|| finding.args.join(", "), |d| finding.message(d.message))
}

fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}
