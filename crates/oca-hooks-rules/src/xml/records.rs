//! Checks on individual `<record>` elements.

use super::{location_of, records, split_xmlid};
use oca_hooks_core::{Emitter, FileContext, FileType, Finding, IndependentRule, RuleError};

/// Reports `<record id="own_module.name">` where the prefix is redundant.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlRedundantModuleName;

impl IndependentRule for XmlRedundantModuleName {
    fn id(&self) -> &'static str {
        "xml-redundant-module-name"
    }

    fn description(&self) -> &'static str {
        "Record id is qualified with its own module name"
    }

    fn message(&self) -> &'static str {
        "Redundant module name <record id=\"{}\"> better using only <record id=\"{}\">"
    }

    fn file_type(&self) -> FileType {
        FileType::Markup
    }

    fn check_file(&self, ctx: &FileContext<'_>, out: &mut Emitter<'_>) -> Result<(), RuleError> {
        let Some(module_name) = ctx.module_name() else {
            return Ok(());
        };
        let Ok(doc) = super::parse(ctx.content) else {
            return Ok(());
        };
        for record in records(&doc) {
            let id = record.attribute("id").unwrap_or_default();
            if let (Some(module), name) = split_xmlid(id) {
                if module == module_name {
                    out.emit(
                        Finding::new(self.id(), ctx.path)
                            .at(location_of(&doc, record))
                            .arg(id)
                            .arg(name),
                    )?;
                }
            }
        }
        Ok(())
    }
}

/// Reports `res.users` records created without `no_reset_password` context,
/// which would send invitation emails on install.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlCreateUserWoResetPassword;

impl IndependentRule for XmlCreateUserWoResetPassword {
    fn id(&self) -> &'static str {
        "xml-create-user-wo-reset-password"
    }

    fn description(&self) -> &'static str {
        "res.users record created without no_reset_password context"
    }

    fn message(&self) -> &'static str {
        "record res.users without context=\"{'no_reset_password': True}\""
    }

    fn file_type(&self) -> FileType {
        FileType::Markup
    }

    fn check_file(&self, ctx: &FileContext<'_>, out: &mut Emitter<'_>) -> Result<(), RuleError> {
        let Ok(doc) = super::parse(ctx.content) else {
            return Ok(());
        };
        for record in records(&doc).filter(|r| r.attribute("model") == Some("res.users")) {
            // A `name` field means the record is created, not updated.
            let creates = record
                .children()
                .any(|c| c.has_tag_name("field") && c.attribute("name") == Some("name"));
            let has_context = record
                .attribute("context")
                .is_some_and(|c| c.contains("no_reset_password"));
            if creates && !has_context {
                out.emit(Finding::new(self.id(), ctx.path).at(location_of(&doc, record)))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check_file, module};
    use std::path::Path;

    #[test]
    fn own_module_prefix_is_redundant() {
        let module = module("sale_extra", "/addons/sale_extra");
        let content = r#"<odoo>
    <record id="sale_extra.view_form" model="ir.ui.view"/>
    <record id="sale.view_form" model="ir.ui.view"/>
    <record id="view_tree" model="ir.ui.view"/>
</odoo>"#;
        let ctx = FileContext::new(
            Path::new("/addons/sale_extra/views/a.xml"),
            content,
            FileType::Markup,
        )
        .with_module(&module, Some("data"));

        let findings = check_file(XmlRedundantModuleName, &ctx);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line(), Some(2));
        assert_eq!(findings[0].args, vec!["sale_extra.view_form", "view_form"]);
    }

    #[test]
    fn redundant_module_name_needs_module() {
        let ctx = FileContext::new(
            Path::new("a.xml"),
            r#"<odoo><record id="a.b"/></odoo>"#,
            FileType::Markup,
        );
        assert!(check_file(XmlRedundantModuleName, &ctx).is_empty());
    }

    #[test]
    fn user_creation_requires_context() {
        let content = r#"<odoo>
    <record id="u1" model="res.users">
        <field name="name">A</field>
    </record>
    <record id="u2" model="res.users" context="{'no_reset_password': True}">
        <field name="name">B</field>
    </record>
    <record id="base.user_admin" model="res.users">
        <field name="tz">UTC</field>
    </record>
</odoo>"#;
        let ctx = FileContext::new(Path::new("data/users.xml"), content, FileType::Markup);
        let findings = check_file(XmlCreateUserWoResetPassword, &ctx);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line(), Some(2));
    }
}
