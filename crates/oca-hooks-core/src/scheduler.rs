//! Check scheduler.
//!
//! A run moves through explicit phases:
//!
//! ```text
//! Idle -> GlobalOpen -> (Open -> Run -> Close)* -> GlobalClose -> Done
//! ```
//!
//! `GlobalOpen` and `GlobalClose` happen exactly once, even with zero
//! targets. Execution is single-threaded; each routine runs to completion
//! before the next starts.

use crate::collector::{ExitStatus, MessageCollector};
use crate::config::EffectiveRuleSet;
use crate::context::{Document, Emitter, FileContext, ModuleContext};
use crate::registry::{RuleRegistry, FILE_UNREADABLE, INTERNAL_ERROR};
use crate::resolver::{FileTarget, ModuleTarget, Resolution, ResolvedTarget};
use crate::rule::{FileType, Routine, RuleDescriptor, RuleError};
use crate::suppression::SuppressionEngine;
use crate::text::read_source;
use crate::types::{Finding, RunReport};
use std::any::Any;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing started.
    Idle,
    /// Run-wide setup.
    GlobalOpen,
    /// Per-target setup: files are loaded; unreadable ones become findings.
    Open,
    /// Routines execute against the target.
    Run,
    /// Per-target teardown: findings are filtered and stored.
    Close,
    /// Run-wide teardown: findings are sorted.
    GlobalClose,
    /// Finished.
    Done,
}

/// Switches that change what a run does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// List active messages instead of checking anything.
    pub list_msgs: bool,
    /// Exit successfully even when findings remain.
    pub force_success: bool,
}

/// What a run produced.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// `list_msgs` mode: the active messages, nothing was checked.
    Listed(Vec<RuleDescriptor>),
    /// A completed check run.
    Checked {
        /// Final findings and counters.
        report: RunReport,
        /// Process result.
        status: ExitStatus,
    },
}

impl Outcome {
    /// Returns the process result.
    #[must_use]
    pub fn status(&self) -> ExitStatus {
        match self {
            Self::Listed(_) => ExitStatus::Success,
            Self::Checked { status, .. } => *status,
        }
    }

    /// Returns the report of a check run.
    #[must_use]
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            Self::Listed(_) => None,
            Self::Checked { report, .. } => Some(report),
        }
    }
}

/// Drives registered routines over resolved targets.
#[derive(Debug)]
pub struct Scheduler<'a> {
    registry: &'a RuleRegistry,
    rules: &'a EffectiveRuleSet,
    options: RunOptions,
    phase: Phase,
    history: Vec<Phase>,
}

impl<'a> Scheduler<'a> {
    /// Creates a scheduler for `registry`, running only `rules`.
    #[must_use]
    pub fn new(registry: &'a RuleRegistry, rules: &'a EffectiveRuleSet) -> Self {
        Self {
            registry,
            rules,
            options: RunOptions::default(),
            phase: Phase::Idle,
            history: vec![Phase::Idle],
        }
    }

    /// Sets run options.
    #[must_use]
    pub fn options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns every phase entered so far, in order.
    #[must_use]
    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    /// Returns the active descriptors, in registry order.
    #[must_use]
    pub fn active_descriptors(&self) -> Vec<RuleDescriptor> {
        self.registry
            .descriptors()
            .into_iter()
            .filter(|d| self.rules.is_active(d.id))
            .collect()
    }

    /// Runs the whole lifecycle over `resolution`.
    pub fn run(&mut self, resolution: &Resolution) -> Outcome {
        if self.options.list_msgs {
            debug!("Listing messages, no checks run");
            self.enter(Phase::Done);
            return Outcome::Listed(self.active_descriptors());
        }

        self.enter(Phase::GlobalOpen);
        info!(
            "Running {} active rules over {} targets",
            self.rules.len(),
            resolution.targets.len()
        );
        let registry = self.registry;
        let mut collector = MessageCollector::new(registry, self.rules);
        let mut suppression = SuppressionEngine::new();
        let mut loader = Loader::default();
        let mut checked = 0;

        let resolution_findings = suppression.filter(resolution.findings.clone());
        store_all(&mut collector, resolution_findings);

        for target in &resolution.targets {
            if target.module().is_some_and(|m| !m.installable) {
                debug!("Skipping {}: module not installable", target.path().display());
                continue;
            }

            self.enter(Phase::Open);
            let mut findings = match target {
                ResolvedTarget::Module(t) => {
                    let documents = loader.documents(t, &mut suppression);
                    self.enter(Phase::Run);
                    self.run_module(t, &documents)
                }
                ResolvedTarget::File(t) => match loader.read(&t.path, &mut suppression) {
                    Some(content) => {
                        self.enter(Phase::Run);
                        self.run_file(t, &content)
                    }
                    None => Vec::new(),
                },
            };
            findings.append(&mut loader.unreadable);
            checked += 1;

            self.enter(Phase::Close);
            store_all(&mut collector, suppression.filter(findings));
        }

        self.enter(Phase::GlobalClose);
        let findings = collector.finish();
        let status = ExitStatus::resolve(&findings, self.options.force_success);
        let report = RunReport {
            findings,
            targets_checked: checked,
            suppressed: suppression.suppressed(),
        };
        info!(
            "Run complete: {} findings in {} targets ({} suppressed)",
            report.findings.len(),
            report.targets_checked,
            report.suppressed
        );
        self.enter(Phase::Done);
        Outcome::Checked { report, status }
    }

    fn enter(&mut self, phase: Phase) {
        debug!("Scheduler {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.history.push(phase);
    }

    fn run_module(&self, target: &ModuleTarget, documents: &[Document]) -> Vec<Finding> {
        let module = &target.module;
        let ctx = ModuleContext::new(module, documents, &target.requested);
        let mut out = Emitter::new(self.registry);
        let mut faults = Vec::new();

        for routine in self.registry.routines() {
            let Routine::Dependent(rule) = routine else {
                continue;
            };
            if !self.rules.is_active(rule.id()) {
                continue;
            }
            let file_type = rule.file_type();
            if file_type != FileType::Manifest && !ctx.has_files_of(file_type) {
                debug!("{}: no {file_type} files in {}", rule.id(), module.name);
                continue;
            }
            debug!("Running {} on module {}", rule.id(), module.name);
            if let Some(fault) = guarded(rule.id(), &module.manifest_path, || {
                rule.check_module(&ctx, &mut out)
            }) {
                faults.push(fault);
            }
        }

        let mut findings = out.into_findings();
        findings.extend(faults);
        findings
    }

    fn run_file(&self, target: &FileTarget, content: &str) -> Vec<Finding> {
        let mut ctx = FileContext::new(&target.path, content, target.file_type);
        if let Some(module) = target.module.as_deref() {
            ctx = ctx.with_module(module, target.section.as_deref());
        }
        let mut out = Emitter::new(self.registry);
        let mut faults = Vec::new();

        for routine in self.registry.routines() {
            let Routine::Independent(rule) = routine else {
                continue;
            };
            if !self.rules.is_active(rule.id()) || rule.file_type() != target.file_type {
                continue;
            }
            debug!("Running {} on {}", rule.id(), target.path.display());
            if let Some(fault) = guarded(rule.id(), &target.path, || rule.check_file(&ctx, &mut out)) {
                faults.push(fault);
            }
        }

        let mut findings = out.into_findings();
        findings.extend(faults);
        findings
    }
}

/// Reads target files, reporting each unreadable path once per run.
#[derive(Debug, Default)]
struct Loader {
    reported: HashSet<PathBuf>,
    unreadable: Vec<Finding>,
}

impl Loader {
    fn read(&mut self, path: &Path, suppression: &mut SuppressionEngine) -> Option<String> {
        match read_source(path) {
            Ok(content) => {
                suppression.observe(path, &content);
                Some(content)
            }
            Err(e) => {
                warn!("Cannot read {}: {e}", path.display());
                if self.reported.insert(path.to_path_buf()) {
                    self.unreadable.push(Finding::new(FILE_UNREADABLE, path).arg(e));
                }
                None
            }
        }
    }

    fn documents(
        &mut self,
        target: &ModuleTarget,
        suppression: &mut SuppressionEngine,
    ) -> Vec<Document> {
        target
            .module
            .files
            .iter()
            .map(|file| Document {
                file: file.clone(),
                content: self.read(&file.path, suppression),
            })
            .collect()
    }
}

fn store_all(collector: &mut MessageCollector<'_>, findings: Vec<Finding>) {
    for finding in findings {
        if let Err(e) = collector.store(finding) {
            warn!("{e}");
        }
    }
}

/// Runs one routine invocation, turning an error or a panic into a single
/// `internal-error` finding.
fn guarded<F>(rule: &str, target: &Path, check: F) -> Option<Finding>
where
    F: FnOnce() -> Result<(), RuleError>,
{
    let message = match catch_unwind(AssertUnwindSafe(check)) {
        Ok(Ok(())) => return None,
        Ok(Err(e)) => e.to_string(),
        Err(payload) => panic_message(payload.as_ref()),
    };
    warn!("Rule {rule} failed on {}: {message}", target.display());
    Some(
        Finding::new(INTERNAL_ERROR, target)
            .arg(rule)
            .arg(message),
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
