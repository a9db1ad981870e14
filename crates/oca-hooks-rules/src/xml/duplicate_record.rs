//! Duplicate record ids across all markup files of a module.

use super::{location_of, records, split_xmlid};
use crate::duplicates::{DuplicateKey, Occurrences};
use oca_hooks_core::{DependentRule, Emitter, FileType, ModuleContext, RuleError};

/// Reports `<record id>` values defined more than once in a module.
///
/// Ids are compared within their data section and `noupdate` flag, with
/// the module's own prefix removed; `base.x` and `x` stay distinct.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDuplicateRecordId;

impl DependentRule for XmlDuplicateRecordId {
    fn id(&self) -> &'static str {
        "xml-duplicate-record-id"
    }

    fn description(&self) -> &'static str {
        "Record id defined more than once in the module"
    }

    fn message(&self) -> &'static str {
        "Duplicate xml record id \"{}\" in {}"
    }

    fn file_type(&self) -> FileType {
        FileType::Markup
    }

    fn check_module(&self, ctx: &ModuleContext<'_>, out: &mut Emitter<'_>) -> Result<(), RuleError> {
        let own = ctx.module.name.as_str();
        let mut seen = Occurrences::default();

        for (file, content) in ctx.documents_of(FileType::Markup) {
            let Ok(doc) = super::parse(content) else {
                continue;
            };
            for record in records(&doc) {
                let id = record.attribute("id").unwrap_or_default();
                let id = match split_xmlid(id) {
                    (Some(module), name) if module == own => name,
                    _ => id,
                };
                let noupdate = record
                    .parent_element()
                    .and_then(|p| p.attribute("noupdate"))
                    .unwrap_or("0");
                let key = DuplicateKey::new(&file.section, id, Some(noupdate));
                seen.record(key, file, location_of(&doc, record).line);
            }
        }

        seen.emit_duplicates(self.id(), out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check_module, module_with};
    use oca_hooks_core::Document;

    fn doc(name: &str, section: &str, content: &str) -> (String, String, String) {
        (name.to_string(), section.to_string(), content.to_string())
    }

    fn run(docs: &[(String, String, String)]) -> Vec<oca_hooks_core::Finding> {
        let (module, documents): (_, Vec<Document>) = module_with("mod_a", docs, FileType::Markup);
        check_module(XmlDuplicateRecordId, &module, &documents)
    }

    #[test]
    fn duplicate_across_files() {
        let findings = run(&[
            doc("x.xml", "data", "<odoo>\n<record id=\"shared\"/>\n</odoo>"),
            doc("y.xml", "data", "<odoo>\n\n<record id=\"shared\"/>\n</odoo>"),
        ]);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].file.ends_with("x.xml"));
        assert_eq!(findings[0].line(), Some(2));
        assert_eq!(findings[0].args, vec!["data/shared", "y.xml:3"]);
    }

    #[test]
    fn own_prefix_is_ignored_but_other_prefix_is_not() {
        let findings = run(&[doc(
            "x.xml",
            "data",
            r#"<odoo><record id="a"/><record id="mod_a.a"/><record id="other.a"/></odoo>"#,
        )]);
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn section_and_noupdate_separate_ids() {
        let findings = run(&[
            doc("x.xml", "data", r#"<odoo><record id="a"/></odoo>"#),
            doc("d.xml", "demo", r#"<odoo><record id="a"/></odoo>"#),
            doc(
                "n.xml",
                "data",
                r#"<odoo><data noupdate="1"><record id="a"/></data></odoo>"#,
            ),
        ]);
        assert!(findings.is_empty());
    }

    #[test]
    fn unparsable_files_are_skipped() {
        let findings = run(&[
            doc("x.xml", "data", r#"<odoo><record id="a"/></odoo>"#),
            doc("y.xml", "data", r#"<odoo><record id="a"/>"#),
        ]);
        assert!(findings.is_empty());
    }
}
