use super::location_of;
use oca_hooks_core::{Emitter, FileContext, FileType, Finding, IndependentRule, RuleError};

/// Reports elements with class `oe_structure` and no `id`. Without an id,
/// website edits to the block cannot be saved.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlOeStructureMissingId;

impl IndependentRule for XmlOeStructureMissingId {
    fn id(&self) -> &'static str {
        "xml-oe-structure-missing-id"
    }

    fn description(&self) -> &'static str {
        "Element with class oe_structure must have an id"
    }

    fn message(&self) -> &'static str {
        "Tag <{}> has 'oe_structure' as a class and therefore must have an id"
    }

    fn file_type(&self) -> FileType {
        FileType::Markup
    }

    fn check_file(&self, ctx: &FileContext<'_>, out: &mut Emitter<'_>) -> Result<(), RuleError> {
        let Ok(doc) = super::parse(ctx.content) else {
            return Ok(());
        };
        for node in doc.descendants().filter(roxmltree::Node::is_element) {
            let is_structure = node
                .attribute("class")
                .is_some_and(|c| c.split_whitespace().any(|class| class == "oe_structure"));
            if is_structure && !node.has_attribute("id") {
                out.emit(
                    Finding::new(self.id(), ctx.path)
                        .at(location_of(&doc, node))
                        .arg(node.tag_name().name()),
                )?;
            }
        }
        Ok(())
    }
}
