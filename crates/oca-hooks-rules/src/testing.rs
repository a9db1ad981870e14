//! Helpers for running a single rule outside the scheduler.

use oca_hooks_core::{
    DependentRule, Document, Emitter, FileContext, FileType, Finding, IndependentRule, Module,
    ModuleContext, ModuleFile, Routine, RuleRegistry,
};
use std::collections::BTreeSet;
use std::path::PathBuf;

pub(crate) fn check_file<R: IndependentRule + Copy + 'static>(
    rule: R,
    ctx: &FileContext<'_>,
) -> Vec<Finding> {
    let registry = RuleRegistry::new().with(Routine::independent(rule));
    let mut out = Emitter::new(&registry);
    rule.check_file(ctx, &mut out).unwrap();
    out.into_findings()
}

pub(crate) fn check_module<R: DependentRule + Copy + 'static>(
    rule: R,
    module: &Module,
    documents: &[Document],
) -> Vec<Finding> {
    let registry = RuleRegistry::new().with(Routine::dependent(rule));
    let requested = BTreeSet::new();
    let ctx = ModuleContext::new(module, documents, &requested);
    let mut out = Emitter::new(&registry);
    rule.check_module(&ctx, &mut out).unwrap();
    out.into_findings()
}

pub(crate) fn module(name: &str, root: &str) -> Module {
    let root = PathBuf::from(root);
    Module {
        manifest_path: root.join("__manifest__.py"),
        root,
        name: name.to_string(),
        title: None,
        category: None,
        installable: true,
        files: Vec::new(),
    }
}

/// Builds an in-memory module from `(short path, section, content)` triples.
pub(crate) fn module_with(
    name: &str,
    docs: &[(String, String, String)],
    file_type: FileType,
) -> (Module, Vec<Document>) {
    let mut module = module(name, &format!("/addons/{name}"));
    let documents: Vec<Document> = docs
        .iter()
        .map(|(short, section, content)| Document {
            file: ModuleFile {
                path: module.root.join(short),
                short: PathBuf::from(short),
                section: section.clone(),
                file_type,
            },
            content: Some(content.clone()),
        })
        .collect();
    module.files = documents.iter().map(|d| d.file.clone()).collect();
    (module, documents)
}
