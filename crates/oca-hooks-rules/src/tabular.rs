//! Tabular (CSV) rules.

use crate::duplicates::{DuplicateKey, Occurrences};
use oca_hooks_core::{
    DependentRule, Emitter, FileContext, FileType, Finding, IndependentRule, ModuleContext,
    RuleError,
};

/// Rows may have more or fewer fields than the header.
fn reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes())
}

fn line_of(position: Option<&csv::Position>) -> u32 {
    position
        .and_then(|p| u32::try_from(p.line()).ok())
        .unwrap_or(1)
}

/// Returns the line of a quoted field that is never closed.
fn unterminated_quote(content: &str) -> Option<u32> {
    let mut line = 1;
    let mut opened = None;
    let mut at_field_start = true;
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        match (opened, c) {
            (Some(_), '"') => {
                // `""` inside a quoted field is an escaped quote.
                if chars.next_if_eq(&'"').is_none() {
                    opened = None;
                }
            }
            (None, '"') if at_field_start => opened = Some(line),
            _ => {}
        }
        if c == '\n' {
            line += 1;
        }
        at_field_start = opened.is_none() && matches!(c, ',' | '\n' | '\r');
    }
    opened
}

/// Reports CSV files the reader rejects or that end inside a quoted field.
/// Rows with a different number of fields than the header are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSyntaxError;

impl IndependentRule for CsvSyntaxError {
    fn id(&self) -> &'static str {
        "csv-syntax-error"
    }

    fn description(&self) -> &'static str {
        "CSV file could not be parsed"
    }

    fn message(&self) -> &'static str {
        "CSV file could not be parsed: {}"
    }

    fn file_type(&self) -> FileType {
        FileType::Tabular
    }

    fn check_file(&self, ctx: &FileContext<'_>, out: &mut Emitter<'_>) -> Result<(), RuleError> {
        let mut rdr = reader(ctx.content);
        let error = rdr
            .headers()
            .err()
            .or_else(|| rdr.records().find_map(Result::err));
        let finding = match error {
            Some(e) => Finding::new(self.id(), ctx.path)
                .at_line(line_of(e.position()))
                .arg(e),
            None => match unterminated_quote(ctx.content) {
                Some(line) => Finding::new(self.id(), ctx.path)
                    .at_line(line)
                    .arg("unterminated quoted field"),
                None => return Ok(()),
            },
        };
        out.emit(finding)?;
        Ok(())
    }
}

/// Reports CSV `id` values defined more than once in a module.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvDuplicateRecordId;

impl DependentRule for CsvDuplicateRecordId {
    fn id(&self) -> &'static str {
        "csv-duplicate-record-id"
    }

    fn description(&self) -> &'static str {
        "CSV record id defined more than once in the module"
    }

    fn message(&self) -> &'static str {
        "Duplicate CSV record id \"{}\" in {}"
    }

    fn file_type(&self) -> FileType {
        FileType::Tabular
    }

    fn check_module(&self, ctx: &ModuleContext<'_>, out: &mut Emitter<'_>) -> Result<(), RuleError> {
        let own = ctx.module.name.as_str();
        let mut seen = Occurrences::default();

        for (file, content) in ctx.documents_of(FileType::Tabular) {
            let mut rdr = reader(content);
            let Some(column) = rdr
                .headers()
                .ok()
                .and_then(|h| h.iter().position(|name| name.trim() == "id"))
            else {
                continue;
            };
            // Rows read before a reader error still count.
            for record in rdr.records().map_while(Result::ok) {
                let id = record.get(column).unwrap_or_default().trim();
                if id.is_empty() {
                    continue;
                }
                let line = line_of(record.position());
                let id = match id.split_once('.') {
                    Some((module, name)) if module == own => name,
                    _ => id,
                };
                seen.record(DuplicateKey::new(&file.section, id, None), file, line);
            }
        }

        seen.emit_duplicates(self.id(), out)
    }
}
