//! Rule traits and descriptors.
//!
//! Rules come in exactly two shapes. An [`IndependentRule`] sees one file at a
//! time. A [`DependentRule`] sees the complete file set a module declares,
//! which is what cross-file checks such as duplicate record ids need.
//! [`Routine`] is the closed union the registry stores.

use crate::collector::CollectorError;
use crate::context::{Emitter, FileContext, ModuleContext};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Kind of artifact a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// XML views, data and templates.
    Markup,
    /// PO/POT translation catalogs.
    Catalog,
    /// CSV record files.
    Tabular,
    /// The module declaration itself.
    Manifest,
}

impl FileType {
    /// Classifies a path by its extension (case-insensitive).
    ///
    /// Returns `None` for extensions no rule understands. Manifests are never
    /// classified this way; the resolver identifies them by name.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xml" => Some(Self::Markup),
            "po" | "pot" => Some(Self::Catalog),
            "csv" => Some(Self::Tabular),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markup => write!(f, "markup"),
            Self::Catalog => write!(f, "catalog"),
            Self::Tabular => write!(f, "tabular"),
            Self::Manifest => write!(f, "manifest"),
        }
    }
}

/// How much of the module a rule needs to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Needs the whole module file set.
    Dependent,
    /// Needs a single file.
    Independent,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dependent => write!(f, "dependent"),
            Self::Independent => write!(f, "independent"),
        }
    }
}

/// Static description of a registered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleDescriptor {
    /// Kebab-case identifier (e.g., "xml-duplicate-record-id").
    pub id: &'static str,
    /// Human-readable description, shown by `--list-msgs`.
    pub description: &'static str,
    /// Message template; `{}` placeholders take the finding arguments.
    pub message: &'static str,
    /// Execution mode.
    pub mode: ExecutionMode,
    /// Artifact kind the rule applies to.
    pub file_type: FileType,
}

/// A fault raised by a rule routine.
///
/// The scheduler never lets one of these escape: each becomes a single
/// `internal-error` finding and scheduling continues.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The routine tried to report an identifier nobody registered.
    #[error(transparent)]
    Unregistered(#[from] CollectorError),

    /// IO error while the routine read something on its own.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Any other unexpected failure.
    #[error("{0}")]
    Other(String),
}

/// A rule that checks a single file.
///
/// # Example
///
/// ```ignore
/// use oca_hooks_core::{Emitter, FileContext, FileType, Finding, IndependentRule, RuleError};
///
/// pub struct NoEmptyFile;
///
/// impl IndependentRule for NoEmptyFile {
///     fn id(&self) -> &'static str { "no-empty-file" }
///     fn file_type(&self) -> FileType { FileType::Markup }
///
///     fn check_file(&self, ctx: &FileContext, out: &mut Emitter) -> Result<(), RuleError> {
///         if ctx.content.trim().is_empty() {
///             out.emit(Finding::new(self.id(), ctx.path))?;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait IndependentRule: Send + Sync {
    /// Returns the kebab-case identifier of this rule.
    fn id(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the message template for findings of this rule.
    fn message(&self) -> &'static str {
        self.description()
    }

    /// Returns the artifact kind this rule applies to.
    fn file_type(&self) -> FileType;

    /// Checks one file, emitting findings into `out`.
    ///
    /// # Errors
    ///
    /// Returns an error on unexpected failure; the scheduler converts it into
    /// an `internal-error` finding.
    fn check_file(&self, ctx: &FileContext<'_>, out: &mut Emitter<'_>) -> Result<(), RuleError>;
}

/// A rule that checks a module's complete file set.
pub trait DependentRule: Send + Sync {
    /// Returns the kebab-case identifier of this rule.
    fn id(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the message template for findings of this rule.
    fn message(&self) -> &'static str {
        self.description()
    }

    /// Returns the artifact kind this rule applies to.
    fn file_type(&self) -> FileType;

    /// Checks a whole module, emitting findings into `out`.
    ///
    /// # Errors
    ///
    /// Returns an error on unexpected failure; the scheduler converts it into
    /// an `internal-error` finding.
    fn check_module(&self, ctx: &ModuleContext<'_>, out: &mut Emitter<'_>)
        -> Result<(), RuleError>;
}

/// A registered checking routine.
pub enum Routine {
    /// Runs once per module target.
    Dependent(Box<dyn DependentRule>),
    /// Runs once per file target.
    Independent(Box<dyn IndependentRule>),
}

impl Routine {
    /// Wraps a dependent rule.
    #[must_use]
    pub fn dependent<R: DependentRule + 'static>(rule: R) -> Self {
        Self::Dependent(Box::new(rule))
    }

    /// Wraps an independent rule.
    #[must_use]
    pub fn independent<R: IndependentRule + 'static>(rule: R) -> Self {
        Self::Independent(Box::new(rule))
    }

    /// Returns the identifier of the wrapped rule.
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::Dependent(r) => r.id(),
            Self::Independent(r) => r.id(),
        }
    }

    /// Builds the descriptor for the wrapped rule.
    #[must_use]
    pub fn descriptor(&self) -> RuleDescriptor {
        match self {
            Self::Dependent(r) => RuleDescriptor {
                id: r.id(),
                description: r.description(),
                message: r.message(),
                mode: ExecutionMode::Dependent,
                file_type: r.file_type(),
            },
            Self::Independent(r) => RuleDescriptor {
                id: r.id(),
                description: r.description(),
                message: r.message(),
                mode: ExecutionMode::Independent,
                file_type: r.file_type(),
            },
        }
    }
}

impl std::fmt::Debug for Routine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let d = self.descriptor();
        write!(f, "Routine({}, {}, {})", d.id, d.mode, d.file_type)
    }
}
