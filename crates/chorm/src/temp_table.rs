//! Local files shipped with a query as ClickHouse external data.

use crate::format::Format;
use std::path::{Path, PathBuf};

/// A temporary table backed by a local file.
///
/// The file is uploaded alongside the query and can be referenced by
/// `name` inside it, e.g. `WHERE id IN ids`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempTable {
    name: String,
    path: PathBuf,
    structure: String,
    format: Format,
}

impl TempTable {
    /// Create a temp table from a file path and a column structure
    /// such as `"id UInt64, name String"`.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, structure: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            structure: structure.into(),
            format: Format::Csv,
        }
    }

    /// Override the file format (CSV by default).
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Table name used inside the query.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Column structure.
    pub fn structure(&self) -> &str {
        &self.structure
    }

    /// File format.
    pub fn file_format(&self) -> Format {
        self.format
    }
}
