//! Line-oriented reader for gettext PO/POT catalogs.

use std::fmt;

/// A parse failure with the 1-indexed line it occurred on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoError {
    /// Line of the offending text.
    pub line: u32,
    /// What was wrong with it.
    pub message: String,
}

impl PoError {
    fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for PoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for PoError {}

/// One catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    /// First line of the entry, comments included.
    pub line: u32,
    /// Line of the first keyword (`msgctxt` or `msgid`), as `msgfmt` reports it.
    pub key_line: u32,
    /// Disambiguating context.
    pub msgctxt: Option<String>,
    /// Source string.
    pub msgid: String,
    /// Plural source string.
    pub msgid_plural: Option<String>,
    /// Translations; one per plural form.
    pub msgstr: Vec<String>,
    /// `#.` comments, joined by newlines.
    pub comment: String,
    /// `#:` source references.
    pub references: Vec<String>,
    /// `#,` flags such as `python-format`.
    pub flags: Vec<String>,
    /// Entry commented out with `#~`.
    pub obsolete: bool,
}

impl Entry {
    /// The metadata entry: empty msgid, no context.
    #[must_use]
    pub fn is_header(&self) -> bool {
        self.msgid.is_empty() && self.msgctxt.is_none()
    }
}

/// A parsed catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Entries in file order, header and obsolete ones included.
    pub entries: Vec<Entry>,
}

impl Catalog {
    /// Parses catalog text.
    ///
    /// # Errors
    ///
    /// Returns the first malformed line: unknown keyword, bad string literal,
    /// a string with no keyword to continue, or an entry lacking `msgstr`.
    pub fn parse(content: &str) -> Result<Self, PoError> {
        let mut reader = Reader::default();
        for (i, raw) in content.lines().enumerate() {
            let line = u32::try_from(i + 1).unwrap_or(u32::MAX);
            reader.line(line, raw)?;
        }
        reader.finish()?;
        Ok(Self {
            entries: reader.entries,
        })
    }

    /// Non-obsolete entries other than the header.
    pub fn messages(&self) -> impl Iterator<Item = &Entry> {
        self.entries
            .iter()
            .filter(|e| !e.obsolete && !e.is_header())
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Context,
    Id,
    IdPlural,
    Str(usize),
}

#[derive(Default)]
struct Reader {
    entries: Vec<Entry>,
    current: Entry,
    started: bool,
    has_msgid: bool,
    has_msgstr: bool,
    last: Option<Field>,
}

impl Reader {
    fn line(&mut self, n: u32, raw: &str) -> Result<(), PoError> {
        let text = raw.trim();
        if text.is_empty() {
            if self.has_msgid {
                self.finish()?;
            }
            return Ok(());
        }

        if let Some(rest) = text.strip_prefix("#~") {
            let rest = rest.trim_start();
            if rest.is_empty() || rest.starts_with('|') {
                return Ok(());
            }
            return self.content(n, rest, true);
        }

        if let Some(rest) = text.strip_prefix('#') {
            if self.has_msgstr {
                self.finish()?;
            }
            self.begin(n);
            self.last = None;
            let mut chars = rest.chars();
            match chars.next() {
                Some('.') => {
                    let comment = chars.as_str().trim();
                    if !self.current.comment.is_empty() {
                        self.current.comment.push('\n');
                    }
                    self.current.comment.push_str(comment);
                }
                Some(':') => self
                    .current
                    .references
                    .extend(chars.as_str().split_whitespace().map(String::from)),
                Some(',') => self.current.flags.extend(
                    chars
                        .as_str()
                        .split(',')
                        .map(str::trim)
                        .filter(|f| !f.is_empty())
                        .map(String::from),
                ),
                _ => {}
            }
            return Ok(());
        }

        self.content(n, text, false)
    }

    fn content(&mut self, n: u32, text: &str, obsolete: bool) -> Result<(), PoError> {
        if text.starts_with('"') {
            let value = unquote(n, text)?;
            let Some(field) = self.last else {
                return Err(PoError::new(n, "string without a preceding keyword"));
            };
            self.field_mut(field).push_str(&value);
            return Ok(());
        }

        let (keyword, rest) = text
            .split_once(|c: char| c.is_whitespace())
            .map_or((text, ""), |(k, r)| (k, r.trim_start()));
        let value = unquote(n, rest)?;

        let field = match keyword {
            "msgctxt" => {
                if self.has_msgid {
                    self.finish()?;
                }
                if self.current.msgctxt.is_some() {
                    return Err(PoError::new(n, "duplicate msgctxt"));
                }
                self.begin(n);
                self.mark_key(n);
                self.current.msgctxt = Some(String::new());
                Field::Context
            }
            "msgid" => {
                if self.has_msgid {
                    self.finish()?;
                }
                self.begin(n);
                self.mark_key(n);
                self.has_msgid = true;
                Field::Id
            }
            "msgid_plural" => {
                if !self.has_msgid || self.has_msgstr {
                    return Err(PoError::new(n, "msgid_plural must follow msgid"));
                }
                self.current.msgid_plural = Some(String::new());
                Field::IdPlural
            }
            _ => {
                let Some(index) = msgstr_index(keyword) else {
                    return Err(PoError::new(n, format!("unknown keyword {keyword:?}")));
                };
                if !self.has_msgid {
                    return Err(PoError::new(n, "msgstr without msgid"));
                }
                self.has_msgstr = true;
                if self.current.msgstr.len() <= index {
                    self.current.msgstr.resize(index + 1, String::new());
                }
                Field::Str(index)
            }
        };

        self.current.obsolete |= obsolete;
        self.field_mut(field).push_str(&value);
        self.last = Some(field);
        Ok(())
    }

    fn begin(&mut self, n: u32) {
        if !self.started {
            self.started = true;
            self.current.line = n;
        }
    }

    fn mark_key(&mut self, n: u32) {
        if self.current.key_line == 0 {
            self.current.key_line = n;
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Context => self.current.msgctxt.get_or_insert_with(String::new),
            Field::Id => &mut self.current.msgid,
            Field::IdPlural => self.current.msgid_plural.get_or_insert_with(String::new),
            Field::Str(i) => &mut self.current.msgstr[i],
        }
    }

    fn finish(&mut self) -> Result<(), PoError> {
        if self.has_msgid && !self.has_msgstr {
            return Err(PoError::new(self.current.key_line, "entry has no msgstr"));
        }
        if self.has_msgid {
            self.entries.push(std::mem::take(&mut self.current));
        } else if self.current.msgctxt.is_some() {
            return Err(PoError::new(self.current.key_line, "msgctxt without msgid"));
        }
        // Trailing comments with no keyword are dropped.
        self.current = Entry::default();
        self.started = false;
        self.has_msgid = false;
        self.has_msgstr = false;
        self.last = None;
        Ok(())
    }
}

/// `msgstr` is index 0; `msgstr[N]` is index N.
fn msgstr_index(keyword: &str) -> Option<usize> {
    if keyword == "msgstr" {
        return Some(0);
    }
    keyword
        .strip_prefix("msgstr[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

fn unquote(n: u32, text: &str) -> Result<String, PoError> {
    let Some(body) = text.strip_prefix('"') else {
        return Err(PoError::new(n, "expected a quoted string"));
    };
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    loop {
        match chars.next() {
            None => return Err(PoError::new(n, "unterminated string")),
            Some('"') => break,
            Some('\\') => {
                let escaped = match chars.next() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('r') => '\r',
                    Some('a') => '\u{7}',
                    Some('b') => '\u{8}',
                    Some('f') => '\u{c}',
                    Some('v') => '\u{b}',
                    Some(c @ ('\\' | '"')) => c,
                    Some(c) => return Err(PoError::new(n, format!("invalid escape \\{c}"))),
                    None => return Err(PoError::new(n, "unterminated string")),
                };
                out.push(escaped);
            }
            Some(c) => out.push(c),
        }
    }
    if !chars.as_str().trim().is_empty() {
        return Err(PoError::new(n, "unexpected text after string"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"# Translation of Odoo Server.
msgid ""
msgstr ""
"Project-Id-Version: Odoo Server 16.0\n"
"Content-Type: text/plain; charset=UTF-8\n"

#. module: sale_extra
#: model:ir.model.fields,field_description:sale_extra.field_a
#, python-format
msgid "Amount %s"
msgstr "Importe %s"

#. module: sale_extra
msgctxt "button"
msgid ""
"Multi"
"line"
msgstr[0] "uno"
msgstr[1] "varios"

#~ msgid "Old"
#~ msgstr "Viejo"
"#;

    #[test]
    fn parses_entries_and_metadata() {
        let catalog = Catalog::parse(SAMPLE).unwrap();
        assert_eq!(catalog.entries.len(), 4);

        let header = &catalog.entries[0];
        assert!(header.is_header());
        assert!(header.msgstr[0].starts_with("Project-Id-Version"));

        let amount = &catalog.entries[1];
        assert_eq!(amount.line, 7);
        assert_eq!(amount.key_line, 10);
        assert_eq!(amount.comment, "module: sale_extra");
        assert_eq!(amount.flags, vec!["python-format"]);
        assert_eq!(amount.references.len(), 1);

        let multi = &catalog.entries[2];
        assert_eq!(multi.msgctxt.as_deref(), Some("button"));
        assert_eq!(multi.msgid, "Multiline");
        assert_eq!(multi.key_line, 14);
        assert_eq!(multi.msgstr, vec!["uno", "varios"]);

        assert!(catalog.entries[3].obsolete);
        assert_eq!(catalog.messages().count(), 2);
    }

    #[test]
    fn entries_without_blank_separator() {
        let catalog = Catalog::parse("msgid \"a\"\nmsgstr \"\"\nmsgid \"b\"\nmsgstr \"\"\n").unwrap();
        assert_eq!(catalog.entries.len(), 2);
        assert_eq!(catalog.entries[1].key_line, 3);
    }

    #[test]
    fn escapes() {
        let catalog = Catalog::parse(r#"msgid "a\"b\n\\"
msgstr """#)
        .unwrap();
        assert_eq!(catalog.entries[0].msgid, "a\"b\n\\");
    }

    #[test]
    fn syntax_errors_carry_line() {
        let cases = [
            ("msgid \"a\"\nmsgstr \"b\n", 2),
            ("msgid \"a\"\nmsgstr \"b\"\nmsgfoo \"c\"\n", 3),
            ("\"orphan\"\n", 1),
            ("msgstr \"b\"\n", 1),
            ("msgid \"a\"\n\nmsgid \"b\"\nmsgstr \"\"\n", 1),
            ("msgid \"a\\q\"\nmsgstr \"\"\n", 1),
            ("msgid \"a\"\nmsgstr \"\"\n\nmsgid \"b\"\n", 4),
        ];
        for (content, line) in cases {
            let err = Catalog::parse(content).unwrap_err();
            assert_eq!(err.line, line, "{content:?}: {err}");
        }
    }
}
