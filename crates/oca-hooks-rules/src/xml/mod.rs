//! Markup (XML) rules and the helpers they share.

mod deprecated;
mod duplicate_record;
mod oe_structure;
mod records;
mod syntax;

pub use deprecated::{XmlDeprecatedDataNode, XmlDeprecatedOpenerpNode, XmlDeprecatedQwebDirective};
pub use duplicate_record::XmlDuplicateRecordId;
pub use oe_structure::XmlOeStructureMissingId;
pub use records::{XmlCreateUserWoResetPassword, XmlRedundantModuleName};
pub use syntax::XmlSyntaxError;

use oca_hooks_core::Location;
use roxmltree::{Document, Node, ParsingOptions};

/// Root element names of Odoo data files.
const DATA_ROOTS: [&str; 2] = ["odoo", "openerp"];

/// Parses `content`, accepting DTDs.
pub(crate) fn parse(content: &str) -> Result<Document<'_>, roxmltree::Error> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(content, options)
}

/// Returns the 1-indexed position of `node`.
pub(crate) fn location_of(doc: &Document<'_>, node: Node<'_, '_>) -> Location {
    let pos = doc.text_pos_at(node.range().start);
    Location::new(pos.row, pos.col)
}

/// Returns the root element if it is `<odoo>` or `<openerp>`.
pub(crate) fn data_root<'a, 'input>(doc: &'a Document<'input>) -> Option<Node<'a, 'input>> {
    let root = doc.root_element();
    DATA_ROOTS
        .contains(&root.tag_name().name())
        .then_some(root)
}

/// Iterates over `<record id="...">` elements below a data root.
pub(crate) fn records<'a, 'input>(
    doc: &'a Document<'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    data_root(doc)
        .into_iter()
        .flat_map(|root| root.descendants())
        .filter(|n| n.has_tag_name("record") && n.has_attribute("id"))
}

/// Splits `module.name` into its parts; unqualified ids have no module.
pub(crate) fn split_xmlid(id: &str) -> (Option<&str>, &str) {
    match id.split_once('.') {
        Some((module, name)) => (Some(module), name),
        None => (None, id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_only_under_data_root() {
        let doc = parse(r#"<odoo><data><record id="a"/><record/></data></odoo>"#).unwrap();
        assert_eq!(records(&doc).count(), 1);

        let doc = parse(r#"<templates><record id="a"/></templates>"#).unwrap();
        assert_eq!(records(&doc).count(), 0);
    }

    #[test]
    fn location_is_one_indexed() {
        let doc = parse("<odoo>\n  <record id=\"a\"/>\n</odoo>").unwrap();
        let record = records(&doc).next().unwrap();
        assert_eq!(location_of(&doc, record), Location::new(2, 3));
    }

    #[test]
    fn xmlid_split() {
        assert_eq!(split_xmlid("base.user_root"), (Some("base"), "user_root"));
        assert_eq!(split_xmlid("user_root"), (None, "user_root"));
    }

    #[test]
    fn doctype_is_accepted() {
        assert!(parse("<!DOCTYPE odoo [<!ENTITY a \"b\">]>\n<odoo/>").is_ok());
    }
}
