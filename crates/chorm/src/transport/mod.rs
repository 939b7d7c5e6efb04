//! Wire transport to a ClickHouse server.
//!
//! [`Transport`] is the seam between a [`Connection`](crate::Connection) and
//! the network. [`HttpTransport`] speaks ClickHouse's HTTP interface; tests
//! and embedders can plug in their own implementation.

mod http;

#[cfg(test)]
mod tests;

pub use http::HttpTransport;

use crate::error::OrmResult;
use crate::temp_table::TempTable;
use crate::value::Row;
use async_trait::async_trait;
use std::path::Path;

/// A compiled statement plus the external data files it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// SQL text.
    pub sql: String,
    /// Files uploaded as temporary tables with the statement.
    pub files: Vec<TempTable>,
}

impl Query {
    /// A statement without external data.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            files: Vec::new(),
        }
    }

    /// Attach external data files.
    pub fn with_files(mut self, files: Vec<TempTable>) -> Self {
        self.files = files;
        self
    }
}

/// Low-level statement execution.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run a query and return its rows.
    async fn select(&self, sql: &str, files: &[TempTable]) -> OrmResult<Vec<Row>>;

    /// Run a statement that produces no result set.
    async fn execute(&self, sql: &str) -> OrmResult<()>;

    /// Run `INSERT ... FORMAT <fmt>` with the body read from a local file.
    async fn insert_file(&self, sql: &str, path: &Path) -> OrmResult<()>;
}
