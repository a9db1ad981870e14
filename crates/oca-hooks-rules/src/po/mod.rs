//! Catalog (PO/POT) rules.

mod parser;

pub use parser::{Catalog, Entry, PoError};

use oca_hooks_core::{Emitter, FileContext, FileType, Finding, IndependentRule, RuleError};
use std::collections::HashMap;

/// Characters of a msgid shown in duplicate reports.
const MSGID_PREVIEW: usize = 40;

/// Reports catalogs that cannot be parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoSyntaxError;

impl IndependentRule for PoSyntaxError {
    fn id(&self) -> &'static str {
        "po-syntax-error"
    }

    fn description(&self) -> &'static str {
        "PO file could not be parsed"
    }

    fn message(&self) -> &'static str {
        "{}"
    }

    fn file_type(&self) -> FileType {
        FileType::Catalog
    }

    fn check_file(&self, ctx: &FileContext<'_>, out: &mut Emitter<'_>) -> Result<(), RuleError> {
        if let Err(e) = Catalog::parse(ctx.content) {
            out.emit(
                Finding::new(self.id(), ctx.path)
                    .at_line(e.line)
                    .arg(e.message),
            )?;
        }
        Ok(())
    }
}

/// Reports a message defined more than once in one catalog.
///
/// Entries are keyed by `(msgctxt, msgid)`; the same msgid under two
/// different contexts is legitimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoDuplicateMessageDefinition;

impl IndependentRule for PoDuplicateMessageDefinition {
    fn id(&self) -> &'static str {
        "po-duplicate-message-definition"
    }

    fn description(&self) -> &'static str {
        "Message defined more than once in the catalog"
    }

    fn message(&self) -> &'static str {
        "Duplicate PO message definition \"{}\" in lines {}"
    }

    fn file_type(&self) -> FileType {
        FileType::Catalog
    }

    fn check_file(&self, ctx: &FileContext<'_>, out: &mut Emitter<'_>) -> Result<(), RuleError> {
        let Ok(catalog) = Catalog::parse(ctx.content) else {
            return Ok(());
        };

        let mut index: HashMap<(Option<&str>, &str), usize> = HashMap::new();
        let mut groups: Vec<Vec<&Entry>> = Vec::new();
        for entry in catalog.messages() {
            let key = (entry.msgctxt.as_deref(), entry.msgid.as_str());
            match index.get(&key) {
                Some(&i) => groups[i].push(entry),
                None => {
                    index.insert(key, groups.len());
                    groups.push(vec![entry]);
                }
            }
        }

        for group in groups {
            let [first, rest @ ..] = group.as_slice() else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let lines = rest
                .iter()
                .map(|e| e.key_line.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            out.emit(
                Finding::new(self.id(), ctx.path)
                    .at_line(first.key_line)
                    .arg(msgid_preview(&first.msgid))
                    .arg(lines),
            )?;
        }
        Ok(())
    }
}

/// Reports entries without a `#. module: NAME` comment.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoRequiresModule;

impl IndependentRule for PoRequiresModule {
    fn id(&self) -> &'static str {
        "po-requires-module"
    }

    fn description(&self) -> &'static str {
        "Translation entry lacks its module comment"
    }

    fn message(&self) -> &'static str {
        "Translation entry requires comment `#. module: MODULE`"
    }

    fn file_type(&self) -> FileType {
        FileType::Catalog
    }

    fn check_file(&self, ctx: &FileContext<'_>, out: &mut Emitter<'_>) -> Result<(), RuleError> {
        let Ok(catalog) = Catalog::parse(ctx.content) else {
            return Ok(());
        };
        for entry in catalog.messages() {
            if !names_module(&entry.comment) {
                out.emit(Finding::new(self.id(), ctx.path).at_line(entry.line))?;
            }
        }
        Ok(())
    }
}

/// Matches `module: NAME` or `modules: NAME` at the start of the comment.
fn names_module(comment: &str) -> bool {
    let Some(rest) = comment.strip_prefix("module") else {
        return false;
    };
    let rest = rest.strip_prefix('s').unwrap_or(rest);
    rest.strip_prefix(": ")
        .and_then(|name| name.chars().next())
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// First characters of a msgid with newlines and tabs removed.
fn msgid_preview(msgid: &str) -> String {
    let head: String = msgid
        .chars()
        .take(MSGID_PREVIEW)
        .filter(|c| !matches!(c, '\n' | '\t'))
        .collect();
    let head = head.trim();
    if msgid.chars().count() > MSGID_PREVIEW {
        format!("{head}...")
    } else {
        head.to_string()
    }
}
