//! Registry constructors.

use crate::{
    CsvDuplicateRecordId, CsvSyntaxError, MissingReadme, PoDuplicateMessageDefinition,
    PoRequiresModule, PoSyntaxError, XmlCreateUserWoResetPassword, XmlDeprecatedDataNode,
    XmlDeprecatedOpenerpNode, XmlDeprecatedQwebDirective, XmlDuplicateRecordId,
    XmlOeStructureMissingId, XmlRedundantModuleName, XmlSyntaxError,
};
use oca_hooks_core::{Routine, RuleRegistry};

/// Returns a registry holding every built-in rule.
#[must_use]
pub fn all_rules() -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    for routine in all_routines() {
        registry.register(routine);
    }
    registry
}

/// Returns every built-in rule, markup first.
#[must_use]
pub fn all_routines() -> Vec<Routine> {
    vec![
        Routine::independent(XmlSyntaxError::new()),
        Routine::independent(XmlRedundantModuleName),
        Routine::independent(XmlDeprecatedOpenerpNode),
        Routine::independent(XmlDeprecatedDataNode),
        Routine::independent(XmlDeprecatedQwebDirective),
        Routine::independent(XmlOeStructureMissingId),
        Routine::independent(XmlCreateUserWoResetPassword),
        Routine::dependent(XmlDuplicateRecordId),
        Routine::independent(CsvSyntaxError),
        Routine::dependent(CsvDuplicateRecordId),
        Routine::independent(PoSyntaxError),
        Routine::independent(PoDuplicateMessageDefinition),
        Routine::independent(PoRequiresModule),
        Routine::dependent(MissingReadme),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use oca_hooks_core::{ExecutionMode, FileType, INTERNAL_ERROR};
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_kebab_case() {
        let routines = all_routines();
        let ids: HashSet<_> = routines.iter().map(Routine::id).collect();
        assert_eq!(ids.len(), routines.len());
        for id in ids {
            assert!(id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }
    }

    #[test]
    fn registry_includes_engine_messages() {
        let registry = all_rules();
        assert!(registry.contains(INTERNAL_ERROR));
        assert!(registry.contains("po-requires-module"));

        let readme = registry.descriptor("missing-readme").unwrap();
        assert_eq!(readme.mode, ExecutionMode::Dependent);
        assert_eq!(readme.file_type, FileType::Manifest);
    }

    #[test]
    fn every_rule_describes_itself() {
        for d in all_rules().descriptors() {
            assert!(!d.description.is_empty(), "{}", d.id);
        }
    }
}
