//! ClickHouse data formats used for file inserts and external data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A ClickHouse input/output format name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Format {
    /// Comma-separated values (default for file inserts).
    #[default]
    #[serde(rename = "CSV")]
    Csv,
    /// CSV with a header row.
    #[serde(rename = "CSVWithNames")]
    CsvWithNames,
    /// Tab-separated values.
    #[serde(rename = "TabSeparated")]
    TabSeparated,
    /// TSV with a header row.
    #[serde(rename = "TabSeparatedWithNames")]
    TabSeparatedWithNames,
    /// One JSON object per line.
    #[serde(rename = "JSONEachRow")]
    JsonEachRow,
    /// Values tuples, as in `INSERT ... VALUES`.
    #[serde(rename = "Values")]
    Values,
    /// Apache Parquet.
    #[serde(rename = "Parquet")]
    Parquet,
}

impl Format {
    /// The name ClickHouse expects after `FORMAT`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Csv => "CSV",
            Format::CsvWithNames => "CSVWithNames",
            Format::TabSeparated => "TabSeparated",
            Format::TabSeparatedWithNames => "TabSeparatedWithNames",
            Format::JsonEachRow => "JSONEachRow",
            Format::Values => "Values",
            Format::Parquet => "Parquet",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
