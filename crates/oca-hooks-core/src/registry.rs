//! Rule registry.
//!
//! Built once at process start and handed to the merger and the scheduler as
//! a shared reference; nothing mutates it during a run.

use crate::rule::{ExecutionMode, FileType, Routine, RuleDescriptor};
use tracing::warn;

/// Reported when a manifest is missing, unreadable or malformed.
pub const MANIFEST_SYNTAX_ERROR: &str = "manifest-syntax-error";

/// Reported when a path argument does not exist.
pub const PATH_NOT_FOUND: &str = "path-not-found";

/// Reported when a rule routine fails unexpectedly.
pub const INTERNAL_ERROR: &str = "internal-error";

/// Reported when a target file cannot be read or decoded.
pub const FILE_UNREADABLE: &str = "file-unreadable";

/// Messages the engine itself emits. They have no routine but obey
/// enable/disable like any rule.
const BUILTIN_MESSAGES: &[RuleDescriptor] = &[
    RuleDescriptor {
        id: MANIFEST_SYNTAX_ERROR,
        description: "Module declaration could not be loaded",
        message: "{}",
        mode: ExecutionMode::Dependent,
        file_type: FileType::Manifest,
    },
    RuleDescriptor {
        id: PATH_NOT_FOUND,
        description: "Path passed on the command line does not exist",
        message: "Path does not exist",
        mode: ExecutionMode::Independent,
        file_type: FileType::Manifest,
    },
    RuleDescriptor {
        id: INTERNAL_ERROR,
        description: "A check failed unexpectedly while running",
        message: "Check {} failed: {}",
        mode: ExecutionMode::Independent,
        file_type: FileType::Manifest,
    },
    RuleDescriptor {
        id: FILE_UNREADABLE,
        description: "A declared or requested file could not be read as text",
        message: "File could not be read: {}",
        mode: ExecutionMode::Independent,
        file_type: FileType::Manifest,
    },
];

/// Maps rule identifiers to the routines implementing them.
#[derive(Debug)]
pub struct RuleRegistry {
    routines: Vec<Routine>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRegistry {
    /// Creates a registry holding only the built-in engine messages.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routines: Vec::new(),
        }
    }

    /// Registers a routine.
    ///
    /// A second routine with an already registered identifier is ignored.
    pub fn register(&mut self, routine: Routine) {
        if self.contains(routine.id()) {
            warn!("Rule {} registered twice, keeping the first", routine.id());
            return;
        }
        self.routines.push(routine);
    }

    /// Registers a routine, builder style.
    #[must_use]
    pub fn with(mut self, routine: Routine) -> Self {
        self.register(routine);
        self
    }

    /// Returns true if `id` names a built-in message or a registered routine.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.descriptor(id).is_some()
    }

    /// Looks up the descriptor for `id`.
    #[must_use]
    pub fn descriptor(&self, id: &str) -> Option<RuleDescriptor> {
        BUILTIN_MESSAGES
            .iter()
            .copied()
            .find(|d| d.id == id)
            .or_else(|| {
                self.routines
                    .iter()
                    .find(|r| r.id() == id)
                    .map(Routine::descriptor)
            })
    }

    /// Returns every descriptor: built-ins first, then routines in
    /// registration order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<RuleDescriptor> {
        BUILTIN_MESSAGES
            .iter()
            .copied()
            .chain(self.routines.iter().map(Routine::descriptor))
            .collect()
    }

    /// Returns every known identifier.
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        BUILTIN_MESSAGES
            .iter()
            .map(|d| d.id)
            .chain(self.routines.iter().map(Routine::id))
    }

    /// Returns the registered routines in registration order.
    #[must_use]
    pub fn routines(&self) -> &[Routine] {
        &self.routines
    }

    /// Returns the number of registered routines (built-ins excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        self.routines.len()
    }

    /// Returns true if no routine is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Emitter, ModuleContext};
    use crate::rule::{DependentRule, RuleError};

    struct Dup(&'static str);

    impl DependentRule for Dup {
        fn id(&self) -> &'static str {
            self.0
        }
        fn file_type(&self) -> FileType {
            FileType::Markup
        }
        fn check_module(
            &self,
            _ctx: &ModuleContext<'_>,
            _out: &mut Emitter<'_>,
        ) -> Result<(), RuleError> {
            Ok(())
        }
    }

    #[test]
    fn builtins_are_always_known() {
        let registry = RuleRegistry::new();
        assert!(registry.contains(MANIFEST_SYNTAX_ERROR));
        assert!(registry.contains(PATH_NOT_FOUND));
        assert!(registry.contains(INTERNAL_ERROR));
        assert!(registry.contains(FILE_UNREADABLE));
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let registry = RuleRegistry::new()
            .with(Routine::dependent(Dup("dup-rule")))
            .with(Routine::dependent(Dup("dup-rule")));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.descriptor("dup-rule").map(|d| d.mode),
            Some(ExecutionMode::Dependent)
        );
    }

    #[test]
    fn descriptors_list_builtins_first() {
        let registry = RuleRegistry::new().with(Routine::dependent(Dup("zzz")));
        let ids: Vec<_> = registry.descriptors().iter().map(|d| d.id).collect();
        assert_eq!(
            ids,
            vec![
                MANIFEST_SYNTAX_ERROR,
                PATH_NOT_FOUND,
                INTERNAL_ERROR,
                FILE_UNREADABLE,
                "zzz"
            ]
        );
    }
}
