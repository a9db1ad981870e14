//! Deprecated markup constructs.

use super::{data_root, location_of};
use oca_hooks_core::{Emitter, FileContext, FileType, Finding, IndependentRule, RuleError};
use roxmltree::NodeType;

/// QWeb directives replaced by `t-options`.
const DEPRECATED_QWEB_DIRECTIVES: [&str; 3] = ["t-esc-options", "t-field-options", "t-raw-options"];

/// Reports `<openerp>` root nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDeprecatedOpenerpNode;

impl IndependentRule for XmlDeprecatedOpenerpNode {
    fn id(&self) -> &'static str {
        "xml-deprecated-openerp-node"
    }

    fn description(&self) -> &'static str {
        "Deprecated <openerp> xml node"
    }

    fn file_type(&self) -> FileType {
        FileType::Markup
    }

    fn check_file(&self, ctx: &FileContext<'_>, out: &mut Emitter<'_>) -> Result<(), RuleError> {
        let Ok(doc) = super::parse(ctx.content) else {
            return Ok(());
        };
        let root = doc.root_element();
        if root.has_tag_name("openerp") {
            out.emit(Finding::new(self.id(), ctx.path).at(location_of(&doc, root)))?;
        }
        Ok(())
    }
}

/// Reports `<odoo><data>` when `<data>` is the only child.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDeprecatedDataNode;

impl IndependentRule for XmlDeprecatedDataNode {
    fn id(&self) -> &'static str {
        "xml-deprecated-data-node"
    }

    fn description(&self) -> &'static str {
        "Needless <data> node wrapping the whole file"
    }

    fn message(&self) -> &'static str {
        "Use <odoo> instead of <odoo><data> or use <odoo noupdate=\"1\"> instead of <odoo><data noupdate=\"1\">"
    }

    fn file_type(&self) -> FileType {
        FileType::Markup
    }

    fn check_file(&self, ctx: &FileContext<'_>, out: &mut Emitter<'_>) -> Result<(), RuleError> {
        let Ok(doc) = super::parse(ctx.content) else {
            return Ok(());
        };
        let Some(root) = data_root(&doc) else {
            return Ok(());
        };
        // Comments count as children: a commented <data> sibling is kept.
        let mut children = root.children().filter(|c| c.node_type() != NodeType::Text);
        let only_child = match (children.next(), children.next()) {
            (Some(child), None) => Some(child),
            _ => None,
        };
        if only_child.is_some_and(|c| c.has_tag_name("data")) {
            out.emit(Finding::new(self.id(), ctx.path).at(location_of(&doc, root)))?;
        }
        Ok(())
    }
}

/// Reports `t-*-options` directives inside templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDeprecatedQwebDirective;

impl IndependentRule for XmlDeprecatedQwebDirective {
    fn id(&self) -> &'static str {
        "xml-deprecated-qweb-directive"
    }

    fn description(&self) -> &'static str {
        "Deprecated QWeb t-*-options directive"
    }

    fn message(&self) -> &'static str {
        "Deprecated QWeb directive \"{}\". Use \"t-options\" instead"
    }

    fn file_type(&self) -> FileType {
        FileType::Markup
    }

    fn check_file(&self, ctx: &FileContext<'_>, out: &mut Emitter<'_>) -> Result<(), RuleError> {
        let Ok(doc) = super::parse(ctx.content) else {
            return Ok(());
        };
        let Some(root) = data_root(&doc) else {
            return Ok(());
        };
        let nodes = root
            .descendants()
            .filter(|n| n.has_tag_name("template"))
            .flat_map(|t| t.descendants().skip(1))
            .filter(roxmltree::Node::is_element);
        for node in nodes {
            let used: Vec<&str> = DEPRECATED_QWEB_DIRECTIVES
                .into_iter()
                .filter(|d| node.has_attribute(*d))
                .collect();
            if !used.is_empty() {
                out.emit(
                    Finding::new(self.id(), ctx.path)
                        .at(location_of(&doc, node))
                        .arg(used.join(", ")),
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::check_file;
    use std::path::Path;

    fn ctx(content: &str) -> FileContext<'_> {
        FileContext::new(Path::new("views/a.xml"), content, FileType::Markup)
    }

    #[test]
    fn openerp_root() {
        assert_eq!(
            check_file(XmlDeprecatedOpenerpNode, &ctx("<openerp><data/></openerp>")).len(),
            1
        );
        assert!(check_file(XmlDeprecatedOpenerpNode, &ctx("<odoo/>")).is_empty());
    }

    #[test]
    fn sole_data_child() {
        let findings = check_file(
            XmlDeprecatedDataNode,
            &ctx("<odoo>\n  <data noupdate=\"1\">\n    <record id=\"a\"/>\n  </data>\n</odoo>"),
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line(), Some(1));

        assert!(check_file(
            XmlDeprecatedDataNode,
            &ctx("<odoo><data/><data noupdate=\"1\"/></odoo>")
        )
        .is_empty());
        assert!(check_file(
            XmlDeprecatedDataNode,
            &ctx("<odoo><!-- header --><data/></odoo>")
        )
        .is_empty());
        assert!(check_file(XmlDeprecatedDataNode, &ctx("<odoo><record id=\"a\"/></odoo>")).is_empty());
    }

    #[test]
    fn qweb_options_inside_templates_only() {
        let content = r#"<odoo>
    <template id="t1">
        <span t-esc="a" t-esc-options="{}"/>
        <span t-field="b" t-field-options="{}" t-raw-options="{}"/>
    </template>
    <record id="r1" model="ir.ui.view">
        <span t-esc-options="{}"/>
    </record>
</odoo>"#;
        let findings = check_file(XmlDeprecatedQwebDirective, &ctx(content));
        let got: Vec<_> = findings.iter().map(|f| (f.line(), f.args[0].as_str())).collect();
        assert_eq!(
            got,
            vec![
                (Some(3), "t-esc-options"),
                (Some(4), "t-field-options, t-raw-options"),
            ]
        );
    }
}
