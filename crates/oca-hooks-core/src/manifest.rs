//! Module declaration files.

use crate::literal::{self, LiteralError, Value};
use crate::types::Location;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Recognized declaration file names, preferred first.
pub const MANIFEST_NAMES: [&str; 2] = ["__manifest__.py", "__openerp__.py"];

/// Manifest keys that list data files, in the order they are read.
pub const DATA_KEYS: [&str; 7] = [
    "data",
    "demo",
    "demo_xml",
    "init_xml",
    "qweb",
    "test",
    "update_xml",
];

/// File every module root must contain besides the manifest.
pub const PACKAGE_MARKER: &str = "__init__.py";

/// Errors loading a module declaration.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest could not be read.
    #[error("{path} could not be read: {source}")]
    Io {
        /// Manifest path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The module root has no package marker.
    #[error("{path} has no __init__.py beside it")]
    MissingInit {
        /// Manifest path.
        path: PathBuf,
    },

    /// The manifest is not a valid literal.
    #[error("{path} could not be loaded: {source}")]
    Syntax {
        /// Manifest path.
        path: PathBuf,
        /// Literal parser error.
        source: LiteralError,
    },

    /// The manifest parsed but has the wrong shape.
    #[error("{path} could not be loaded: {message}")]
    Shape {
        /// Manifest path.
        path: PathBuf,
        /// What is wrong.
        message: String,
    },
}

impl ManifestError {
    /// Returns the position of the error inside the manifest, when known.
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::Syntax { source, .. } => Some(Location::new(source.line, source.column)),
            _ => None,
        }
    }

    /// Returns the manifest path the error belongs to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::MissingInit { path }
            | Self::Syntax { path, .. }
            | Self::Shape { path, .. } => path,
        }
    }
}

/// One entry of a data key, as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntry {
    /// Data key that listed the entry (e.g., "data", "demo").
    pub section: &'static str,
    /// Path or glob relative to the module root.
    pub pattern: String,
}

/// A loaded module declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    /// Path of the declaration file.
    pub path: PathBuf,
    /// Human-readable title (`name` key).
    pub title: Option<String>,
    /// Category, when declared.
    pub category: Option<String>,
    /// `installable` key; defaults to true.
    pub installable: bool,
    /// Declared data entries, in key order then list order.
    pub data: Vec<DataEntry>,
}

impl Manifest {
    /// Returns true if `path` is named like a manifest.
    #[must_use]
    pub fn is_manifest_path(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| MANIFEST_NAMES.contains(&n))
    }

    /// Returns the manifest inside `dir`, if there is one.
    #[must_use]
    pub fn find_in(dir: &Path) -> Option<PathBuf> {
        MANIFEST_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
    }

    /// Reads and parses the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file is unreadable, the module root lacks
    /// `__init__.py`, or the content is not a dict literal.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let has_init = path
            .parent()
            .is_some_and(|root| root.join(PACKAGE_MARKER).is_file());
        if !has_init {
            return Err(ManifestError::MissingInit {
                path: path.to_path_buf(),
            });
        }
        Self::parse(path, &content)
    }

    /// Parses manifest `content` read from `path`.
    ///
    /// # Errors
    ///
    /// Fails if the content is not a dict literal or a data key is not a
    /// list of strings.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ManifestError> {
        let value = literal::parse(content).map_err(|e| ManifestError::Syntax {
            path: path.to_path_buf(),
            source: e,
        })?;
        let shape = |message: String| ManifestError::Shape {
            path: path.to_path_buf(),
            message,
        };
        if !matches!(value, Value::Dict(_)) {
            return Err(shape("top level is not a dict".into()));
        }

        let mut data = Vec::new();
        for section in DATA_KEYS {
            let items = match value.get(section) {
                None | Some(Value::None) => continue,
                Some(Value::List(items)) => items,
                Some(_) => return Err(shape(format!("'{section}' is not a list"))),
            };
            for item in items {
                let Some(pattern) = item.as_str() else {
                    return Err(shape(format!("'{section}' holds a non-string entry")));
                };
                data.push(DataEntry {
                    section,
                    pattern: pattern.to_string(),
                });
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            title: value.get("name").and_then(Value::as_str).map(String::from),
            category: value
                .get("category")
                .and_then(Value::as_str)
                .map(String::from),
            installable: value.get("installable").map_or(true, Value::is_truthy),
            data,
        })
    }

    /// Returns the module root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}
