//! Bookkeeping shared by the duplicate record id rules.

use oca_hooks_core::{Emitter, Finding, ModuleFile, RuleError};
use std::collections::HashMap;
use std::path::PathBuf;

/// Identity of a record for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct DuplicateKey {
    section: String,
    id: String,
    noupdate: Option<String>,
}

impl DuplicateKey {
    pub(crate) fn new(section: &str, id: &str, noupdate: Option<&str>) -> Self {
        Self {
            section: section.to_string(),
            id: id.to_string(),
            noupdate: noupdate.map(String::from),
        }
    }

    fn label(&self) -> String {
        format!("{}/{}", self.section, self.id)
    }
}

struct Occurrence {
    path: PathBuf,
    short: PathBuf,
    line: u32,
}

/// Occurrences per key, in first-seen order.
#[derive(Default)]
pub(crate) struct Occurrences {
    index: HashMap<DuplicateKey, usize>,
    entries: Vec<(DuplicateKey, Vec<Occurrence>)>,
}

impl Occurrences {
    pub(crate) fn record(&mut self, key: DuplicateKey, file: &ModuleFile, line: u32) {
        let occurrence = Occurrence {
            path: file.path.clone(),
            short: file.short.clone(),
            line,
        };
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].1.push(occurrence);
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, vec![occurrence]));
        }
    }

    /// Emits one finding per duplicated key, at its first occurrence.
    pub(crate) fn emit_duplicates(self, rule: &str, out: &mut Emitter<'_>) -> Result<(), RuleError> {
        for (key, occurrences) in self.entries {
            let [first, rest @ ..] = occurrences.as_slice() else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let others = rest
                .iter()
                .map(|o| format!("{}:{}", o.short.display(), o.line))
                .collect::<Vec<_>>()
                .join(", ");
            out.emit(
                Finding::new(rule, &first.path)
                    .at_line(first.line)
                    .arg(key.label())
                    .arg(others),
            )?;
        }
        Ok(())
    }
}
