//! Reports markup files that are not well-formed.

use oca_hooks_core::{Emitter, FileContext, FileType, Finding, IndependentRule, Location, RuleError};

/// Rule name for xml-syntax-error.
pub const NAME: &str = "xml-syntax-error";

/// Reports XML files that fail to parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSyntaxError;

impl XmlSyntaxError {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl IndependentRule for XmlSyntaxError {
    fn id(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "XML file's syntax is not correct"
    }

    fn message(&self) -> &'static str {
        "XML file's syntax is not correct: {}"
    }

    fn file_type(&self) -> FileType {
        FileType::Markup
    }

    fn check_file(&self, ctx: &FileContext<'_>, out: &mut Emitter<'_>) -> Result<(), RuleError> {
        if let Err(e) = super::parse(ctx.content) {
            let pos = e.pos();
            out.emit(
                Finding::new(NAME, ctx.path)
                    .at(Location::new(pos.row, pos.col))
                    .arg(e),
            )?;
        }
        Ok(())
    }
}
