//! Module-level readme rule.

use oca_hooks_core::{DependentRule, Emitter, FileType, Finding, ModuleContext, RuleError};

/// Accepted readme file names, in lookup order.
pub const README_FILES: [&str; 3] = ["README.md", "README.txt", "README.rst"];

/// Template linked from the finding.
pub const README_TEMPLATE_URL: &str =
    "https://github.com/OCA/maintainer-tools/blob/master/template/module/README.rst";

/// Reports modules with no readme file at their root.
///
/// The finding is attached to the manifest, so a suppression directive in
/// the manifest silences it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingReadme;

impl DependentRule for MissingReadme {
    fn id(&self) -> &'static str {
        "missing-readme"
    }

    fn description(&self) -> &'static str {
        "Module has no README file"
    }

    fn message(&self) -> &'static str {
        "Missing README file ({}). Template here: {}"
    }

    fn file_type(&self) -> FileType {
        FileType::Manifest
    }

    fn check_module(&self, ctx: &ModuleContext<'_>, out: &mut Emitter<'_>) -> Result<(), RuleError> {
        let root = &ctx.module.root;
        if README_FILES.iter().any(|name| root.join(name).is_file()) {
            return Ok(());
        }
        out.emit(
            Finding::new(self.id(), &ctx.module.manifest_path)
                .arg(README_FILES.join(", "))
                .arg(README_TEMPLATE_URL),
        )?;
        Ok(())
    }
}
