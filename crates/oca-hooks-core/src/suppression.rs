//! Inline suppression directives.
//!
//! A directive is a comment such as `<!-- oca-hooks:disable=rule-a,rule-b -->`
//! or `# oca-hooks:disable=rule-a`. It applies to the whole file it appears
//! in, wherever it is placed. A list ending in a comma continues on the next
//! line.

use crate::text::read_source;
use crate::types::Finding;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Text that introduces a directive.
pub const DIRECTIVE_PREFIX: &str = "oca-hooks:disable=";

/// Rule identifiers disabled for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionDirective {
    /// Disabled identifiers.
    pub rules: BTreeSet<String>,
    /// Line the directive starts on (1-indexed).
    pub line: u32,
}

impl SuppressionDirective {
    /// Returns every directive in `text`, in document order.
    #[must_use]
    pub fn parse_all(text: &str) -> Vec<Self> {
        text.match_indices(DIRECTIVE_PREFIX)
            .filter_map(|(offset, _)| {
                let rules = parse_payload(&text[offset + DIRECTIVE_PREFIX.len()..]);
                if rules.is_empty() {
                    return None;
                }
                let line = text[..offset].matches('\n').count() + 1;
                Some(Self {
                    rules,
                    line: u32::try_from(line).unwrap_or(u32::MAX),
                })
            })
            .collect()
    }

    /// Returns the directive of `text`.
    ///
    /// Only one directive per file is recognized. When several are present
    /// the first is used and a warning is logged.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut all = Self::parse_all(text).into_iter();
        let first = all.next()?;
        let extra: Vec<u32> = all.map(|d| d.line).collect();
        if !extra.is_empty() {
            warn!(
                "Multiple suppression directives found (lines {}, {extra:?}); only the first is applied",
                first.line
            );
        }
        Some(first)
    }

    /// Returns true if `rule` is disabled by this directive.
    #[must_use]
    pub fn covers(&self, rule: &str) -> bool {
        self.rules.contains(rule)
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn parse_payload(rest: &str) -> BTreeSet<String> {
    let mut rules = BTreeSet::new();
    let mut s = rest.trim_start_matches([' ', '\t']);
    loop {
        let len = s.find(|c: char| !is_id_char(c)).unwrap_or(s.len());
        // Trailing dashes belong to a closing `-->`.
        let token = s[..len].trim_end_matches('-');
        if !token.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            break;
        }
        rules.insert(token.to_string());
        s = s[len..].trim_start_matches([' ', '\t']);
        let Some(next) = s.strip_prefix(',') else {
            break;
        };
        s = next.trim_start();
    }
    rules
}

/// Applies per-file directives to findings.
///
/// Each file is parsed at most once per run: either when the scheduler
/// reads it, or on the first finding attached to it.
#[derive(Debug, Default)]
pub struct SuppressionEngine {
    directives: HashMap<PathBuf, Option<SuppressionDirective>>,
    suppressed: usize,
}

impl SuppressionEngine {
    /// Creates an engine with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the directive of a file whose content is already loaded.
    pub fn observe(&mut self, path: &Path, content: &str) {
        if self.directives.contains_key(path) {
            return;
        }
        let directive = SuppressionDirective::parse(content);
        if let Some(d) = &directive {
            debug!("{} disables {:?}", path.display(), d.rules);
        }
        self.directives.insert(path.to_path_buf(), directive);
    }

    /// Returns the directive of `path`, reading the file if it has not been
    /// seen yet. Unreadable files have no directive.
    pub fn directive_for(&mut self, path: &Path) -> Option<&SuppressionDirective> {
        if !self.directives.contains_key(path) {
            match read_source(path) {
                Ok(content) => self.observe(path, &content),
                Err(e) => {
                    debug!("No directive read from {}: {e}", path.display());
                    self.directives.insert(path.to_path_buf(), None);
                }
            }
        }
        self.directives.get(path).and_then(Option::as_ref)
    }

    /// Drops every finding whose file disables its rule.
    pub fn filter(&mut self, findings: Vec<Finding>) -> Vec<Finding> {
        let before = findings.len();
        let kept: Vec<Finding> = findings
            .into_iter()
            .filter(|f| {
                !self
                    .directive_for(&f.file)
                    .is_some_and(|d| d.covers(&f.rule))
            })
            .collect();
        self.suppressed += before - kept.len();
        kept
    }

    /// Returns how many findings were dropped so far.
    #[must_use]
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }
}
