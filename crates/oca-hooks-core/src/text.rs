//! Reading data files as text.
//!
//! Files are read as bytes. Valid UTF-8 is used as is; otherwise the file's
//! own declaration decides: the XML declaration's `encoding` for markup, the
//! header's `charset=` for catalogs. Latin-1 declarations are decoded byte
//! for byte, anything else that is not UTF-8 is an error.

use std::path::Path;
use thiserror::Error;

/// Bytes inspected for an encoding declaration.
const HEAD_LEN: usize = 1024;

/// Declared names decoded as ISO-8859-1.
const LATIN1_NAMES: [&str; 6] = [
    "iso-8859-1",
    "iso8859-1",
    "iso_8859-1",
    "latin-1",
    "latin1",
    "l1",
];

/// Why a file could not be turned into text.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file could not be read.
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes are not valid in the file's encoding.
    #[error("cannot decode {encoding} text: invalid byte at offset {offset}")]
    Decode {
        /// Declared encoding, or `UTF-8` when none is declared.
        encoding: String,
        /// Offset of the first invalid byte.
        offset: usize,
    },
}

/// Reads `path` and decodes it.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be read and
/// [`SourceError::Decode`] if its bytes cannot be decoded.
pub fn read_source(path: &Path) -> Result<String, SourceError> {
    decode_source(std::fs::read(path)?)
}

/// Decodes file contents.
///
/// # Errors
///
/// Returns [`SourceError::Decode`] for bytes that are neither UTF-8 nor in a
/// declared Latin-1 encoding.
pub fn decode_source(bytes: Vec<u8>) -> Result<String, SourceError> {
    let err = match String::from_utf8(bytes) {
        Ok(text) => return Ok(text),
        Err(err) => err,
    };
    let offset = err.utf8_error().valid_up_to();
    let bytes = err.into_bytes();
    match declared_encoding(&bytes) {
        Some(name) if LATIN1_NAMES.contains(&name.as_str()) => {
            Ok(bytes.iter().map(|&b| char::from(b)).collect())
        }
        name => Err(SourceError::Decode {
            encoding: name.unwrap_or_else(|| "UTF-8".to_string()),
            offset,
        }),
    }
}

/// Returns the lowercased encoding named by an XML declaration or a
/// `charset=` header near the start of the file.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(HEAD_LEN)]);
    if let Some(decl) = head.trim_start_matches('\u{feff}').strip_prefix("<?xml") {
        let decl = &decl[..decl.find("?>")?];
        let value = decl
            .split_once("encoding")?
            .1
            .trim_start()
            .strip_prefix('=')?
            .trim_start();
        let quote = value.chars().next().filter(|c| matches!(c, '"' | '\''))?;
        return value[1..].split(quote).next().map(str::to_ascii_lowercase);
    }
    let (_, rest) = head.split_once("charset=")?;
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    (!name.is_empty()).then(|| name.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_is_passed_through() {
        let text = "\u{feff}<odoo>caf\u{e9}</odoo>";
        assert_eq!(decode_source(text.as_bytes().to_vec()).unwrap(), text);
    }

    #[test]
    fn latin1_xml_declaration_is_honored() {
        let bytes = b"<?xml version='1.0' encoding='ISO-8859-1'?>\n<odoo>caf\xE9</odoo>".to_vec();
        let text = decode_source(bytes).unwrap();
        assert!(text.ends_with("<odoo>caf\u{e9}</odoo>"));
    }

    #[test]
    fn latin1_catalog_charset_is_honored() {
        let bytes = b"msgid \"\"\nmsgstr \"\"\n\"Content-Type: text/plain; charset=latin1\\n\"\n\nmsgid \"a\"\nmsgstr \"\xE9\"\n".to_vec();
        let text = decode_source(bytes).unwrap();
        assert!(text.contains("msgstr \"\u{e9}\""));
    }

    #[test]
    fn undeclared_invalid_bytes_are_an_error() {
        let err = decode_source(b"<odoo>caf\xE9</odoo>".to_vec()).unwrap_err();
        assert!(matches!(err, SourceError::Decode { ref encoding, offset: 9 } if encoding == "UTF-8"));
        assert_eq!(
            err.to_string(),
            "cannot decode UTF-8 text: invalid byte at offset 9"
        );
    }

    #[test]
    fn other_declared_encodings_are_not_guessed() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"EUC-JP\"?><odoo>\xA4\xA2</odoo>".to_vec();
        let err = decode_source(bytes).unwrap_err();
        assert!(matches!(err, SourceError::Decode { ref encoding, .. } if encoding == "euc-jp"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            read_source(&tmp.path().join("gone.xml")),
            Err(SourceError::Io(_))
        ));
    }
}
