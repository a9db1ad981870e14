//! # oca-hooks-rules
//!
//! Built-in checks for Odoo addon data files.
//!
//! ## Available Rules
//!
//! | Id | Mode | Artifact |
//! |----|------|----------|
//! | `xml-syntax-error` | independent | markup |
//! | `xml-redundant-module-name` | independent | markup |
//! | `xml-deprecated-openerp-node` | independent | markup |
//! | `xml-deprecated-data-node` | independent | markup |
//! | `xml-deprecated-qweb-directive` | independent | markup |
//! | `xml-oe-structure-missing-id` | independent | markup |
//! | `xml-create-user-wo-reset-password` | independent | markup |
//! | `xml-duplicate-record-id` | dependent | markup |
//! | `csv-syntax-error` | independent | tabular |
//! | `csv-duplicate-record-id` | dependent | tabular |
//! | `po-syntax-error` | independent | catalog |
//! | `po-duplicate-message-definition` | independent | catalog |
//! | `po-requires-module` | independent | catalog |
//! | `missing-readme` | dependent | manifest |
//!
//! ## Usage
//!
//! ```ignore
//! use oca_hooks_core::{ConfigMerger, ModuleResolver, Scheduler};
//!
//! let registry = oca_hooks_rules::all_rules();
//! let merged = ConfigMerger::new().merge(&registry);
//! let resolution = ModuleResolver::default().resolve(&["addons"]);
//! let outcome = Scheduler::new(&registry, &merged.rules).run(&resolution);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod duplicates;
mod po;
mod presets;
mod readme;
mod tabular;
mod xml;

#[cfg(test)]
mod testing;

pub use po::{
    Catalog, Entry, PoDuplicateMessageDefinition, PoError, PoRequiresModule, PoSyntaxError,
};
pub use presets::{all_routines, all_rules};
pub use readme::{MissingReadme, README_FILES, README_TEMPLATE_URL};
pub use tabular::{CsvDuplicateRecordId, CsvSyntaxError};
pub use xml::{
    XmlCreateUserWoResetPassword, XmlDeprecatedDataNode, XmlDeprecatedOpenerpNode,
    XmlDeprecatedQwebDirective, XmlDuplicateRecordId, XmlOeStructureMissingId,
    XmlRedundantModuleName, XmlSyntaxError,
};

/// Re-export core types for convenience.
pub use oca_hooks_core::{DependentRule, Finding, IndependentRule, RuleRegistry};
