//! Message collector and exit status resolution.

use crate::config::EffectiveRuleSet;
use crate::registry::RuleRegistry;
use crate::types::Finding;
use thiserror::Error;
use tracing::debug;

/// Contract violations detected while collecting findings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectorError {
    /// A finding named a rule identifier the registry does not know.
    #[error("Rule '{rule}' is not registered")]
    UnregisteredRule {
        /// The offending identifier.
        rule: String,
    },
}

/// Accumulates the findings of one run.
///
/// Duplicates are kept; they are rule output. Findings of identifiers that
/// are registered but not active in this run are dropped on arrival.
#[derive(Debug)]
pub struct MessageCollector<'a> {
    registry: &'a RuleRegistry,
    active: &'a EffectiveRuleSet,
    findings: Vec<Finding>,
}

impl<'a> MessageCollector<'a> {
    /// Creates an empty collector.
    #[must_use]
    pub fn new(registry: &'a RuleRegistry, active: &'a EffectiveRuleSet) -> Self {
        Self {
            registry,
            active,
            findings: Vec::new(),
        }
    }

    /// Stores one finding.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::UnregisteredRule`] if the finding's
    /// identifier is unknown to the registry.
    pub fn store(&mut self, finding: Finding) -> Result<(), CollectorError> {
        if !self.registry.contains(&finding.rule) {
            return Err(CollectorError::UnregisteredRule { rule: finding.rule });
        }
        if !self.active.is_active(&finding.rule) {
            debug!("Dropping finding of inactive rule {}", finding.rule);
            return Ok(());
        }
        self.findings.push(finding);
        Ok(())
    }

    /// Returns the findings stored so far.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Returns the number of stored findings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.findings.len()
    }

    /// Returns true if nothing was stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Consumes the collector, returning findings sorted by file, then line,
    /// then column. The sort is stable, so emission order breaks ties.
    #[must_use]
    pub fn finish(mut self) -> Vec<Finding> {
        self.findings.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then_with(|| a.line().cmp(&b.line()))
                .then_with(|| {
                    let col = |f: &Finding| f.location.and_then(|l| l.column);
                    col(a).cmp(&col(b))
                })
        });
        self.findings
    }
}

/// Process result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// No findings remain, or success was forced.
    Success,
    /// At least one finding remains.
    Failure,
}

impl ExitStatus {
    /// Computes the status from the final, post-suppression findings.
    ///
    /// `force_success` only changes the status, never the findings.
    #[must_use]
    pub fn resolve(findings: &[Finding], force_success: bool) -> Self {
        if force_success || findings.is_empty() {
            Self::Success
        } else {
            Self::Failure
        }
    }

    /// Returns the numeric process exit code.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
        }
    }

    /// Returns true for [`ExitStatus::Success`].
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigMerger, ConfigSource, RuleDirectives};
    use crate::registry::{INTERNAL_ERROR, PATH_NOT_FOUND};

    #[test]
    fn store_rejects_unregistered_identifier() {
        let registry = RuleRegistry::new();
        let active = EffectiveRuleSet::all(&registry);
        let mut collector = MessageCollector::new(&registry, &active);

        let err = collector
            .store(Finding::new("xml-duplicat-record-id", "a.xml"))
            .unwrap_err();
        assert_eq!(
            err,
            CollectorError::UnregisteredRule {
                rule: "xml-duplicat-record-id".into()
            }
        );
        assert!(collector.is_empty());
    }

    #[test]
    fn store_drops_inactive_identifier() {
        let registry = RuleRegistry::new();
        let active = ConfigMerger::new()
            .source(
                ConfigSource::CommandLine,
                RuleDirectives::new().disable([PATH_NOT_FOUND]),
            )
            .merge(&registry)
            .rules;
        let mut collector = MessageCollector::new(&registry, &active);

        collector.store(Finding::new(PATH_NOT_FOUND, "gone")).unwrap();
        collector.store(Finding::new(INTERNAL_ERROR, "x.xml")).unwrap();
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn finish_sorts_by_file_then_line() {
        let registry = RuleRegistry::new();
        let active = EffectiveRuleSet::all(&registry);
        let mut collector = MessageCollector::new(&registry, &active);
        collector
            .store(Finding::new(INTERNAL_ERROR, "b.xml").at_line(1))
            .unwrap();
        collector
            .store(Finding::new(INTERNAL_ERROR, "a.xml").at_line(9))
            .unwrap();
        collector
            .store(Finding::new(INTERNAL_ERROR, "a.xml").at_line(2))
            .unwrap();

        let lines: Vec<_> = collector
            .finish()
            .iter()
            .map(|f| (f.file.display().to_string(), f.line()))
            .collect();
        assert_eq!(
            lines,
            vec![
                ("a.xml".to_string(), Some(2)),
                ("a.xml".to_string(), Some(9)),
                ("b.xml".to_string(), Some(1)),
            ]
        );
    }

    #[test]
    fn exit_status_override_only_touches_status() {
        let findings = vec![Finding::new(INTERNAL_ERROR, "x.xml")];
        assert_eq!(ExitStatus::resolve(&findings, false).code(), 1);
        assert_eq!(ExitStatus::resolve(&findings, true).code(), 0);
        assert_eq!(findings.len(), 1);
        assert!(ExitStatus::resolve(&[], false).is_success());
    }
}
