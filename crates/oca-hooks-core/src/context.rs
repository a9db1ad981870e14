//! Context types handed to rule routines, and the finding emitter.

use crate::collector::CollectorError;
use crate::registry::RuleRegistry;
use crate::resolver::{Module, ModuleFile};
use crate::rule::FileType;
use crate::types::Finding;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Context provided to independent rules.
#[derive(Debug, Clone)]
pub struct FileContext<'a> {
    /// Absolute path to the file.
    pub path: &'a Path,
    /// File contents.
    pub content: &'a str,
    /// Artifact kind of the file.
    pub file_type: FileType,
    /// Enclosing module, when the file belongs to one.
    pub module: Option<&'a Module>,
    /// Manifest data section that declared the file (e.g., "data", "demo").
    pub section: Option<&'a str>,
}

impl<'a> FileContext<'a> {
    /// Creates a context for a file outside any module.
    #[must_use]
    pub fn new(path: &'a Path, content: &'a str, file_type: FileType) -> Self {
        Self {
            path,
            content,
            file_type,
            module: None,
            section: None,
        }
    }

    /// Attaches module membership to this context.
    #[must_use]
    pub fn with_module(mut self, module: &'a Module, section: Option<&'a str>) -> Self {
        self.module = Some(module);
        self.section = section;
        self
    }

    /// Returns the technical name of the enclosing module.
    #[must_use]
    pub fn module_name(&self) -> Option<&str> {
        self.module.map(|m| m.name.as_str())
    }

    /// Returns the path relative to the module root, or the path itself.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        self.module
            .and_then(|m| self.path.strip_prefix(&m.root).ok())
            .map_or_else(|| self.path.to_path_buf(), Path::to_path_buf)
    }
}

/// One module file together with its loaded text.
#[derive(Debug, Clone)]
pub struct Document {
    /// The declared file.
    pub file: ModuleFile,
    /// File contents; `None` when the file could not be read or decoded, in
    /// which case a `file-unreadable` finding is reported instead.
    pub content: Option<String>,
}

/// Context provided to dependent rules.
#[derive(Debug, Clone)]
pub struct ModuleContext<'a> {
    /// The module being checked.
    pub module: &'a Module,
    /// Every declared file with its contents, in declaration order.
    pub documents: &'a [Document],
    /// Files the user named explicitly on the command line.
    pub requested: &'a BTreeSet<PathBuf>,
}

impl<'a> ModuleContext<'a> {
    /// Creates a new module context.
    #[must_use]
    pub fn new(
        module: &'a Module,
        documents: &'a [Document],
        requested: &'a BTreeSet<PathBuf>,
    ) -> Self {
        Self {
            module,
            documents,
            requested,
        }
    }

    /// Iterates over readable documents of one artifact kind.
    pub fn documents_of(
        &self,
        file_type: FileType,
    ) -> impl Iterator<Item = (&'a ModuleFile, &'a str)> + '_ {
        self.documents.iter().filter_map(move |doc| {
            if doc.file.file_type != file_type {
                return None;
            }
            doc.content.as_deref().map(|c| (&doc.file, c))
        })
    }

    /// Returns true if the module declares at least one file of `file_type`.
    #[must_use]
    pub fn has_files_of(&self, file_type: FileType) -> bool {
        self.documents
            .iter()
            .any(|doc| doc.file.file_type == file_type)
    }

    /// Returns true if `path` was passed explicitly by the user.
    #[must_use]
    pub fn is_requested(&self, path: &Path) -> bool {
        self.requested.contains(path)
    }
}

/// Sink that rule routines report findings into.
///
/// Every finding is checked against the registry at emission time, so a
/// misspelled identifier fails the offending rule invocation immediately.
#[derive(Debug)]
pub struct Emitter<'a> {
    registry: &'a RuleRegistry,
    pending: Vec<Finding>,
}

impl<'a> Emitter<'a> {
    /// Creates an emitter that accepts identifiers known to `registry`.
    #[must_use]
    pub fn new(registry: &'a RuleRegistry) -> Self {
        Self {
            registry,
            pending: Vec::new(),
        }
    }

    /// Records a finding.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::UnregisteredRule`] if the finding's rule
    /// identifier is not registered.
    pub fn emit(&mut self, finding: Finding) -> Result<(), CollectorError> {
        if !self.registry.contains(&finding.rule) {
            return Err(CollectorError::UnregisteredRule {
                rule: finding.rule,
            });
        }
        self.pending.push(finding);
        Ok(())
    }

    /// Returns the findings emitted so far.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.pending
    }

    /// Consumes the emitter, returning its findings.
    #[must_use]
    pub fn into_findings(self) -> Vec<Finding> {
        self.pending
    }
}
