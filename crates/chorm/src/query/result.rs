use crate::error::OrmResult;
use crate::value::{Row, from_row};
use serde::de::DeserializeOwned;
use std::ops::Index;

/// Rows returned by [`Builder::get`](crate::Builder::get).
///
/// A synchronous query yields one row set. A query with async companions
/// yields one set per statement, in submission order. Row accessors
/// (`rows`, `first`, `len`, indexing) read the first set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    sets: Vec<Vec<Row>>,
}

impl QueryResult {
    /// Wrap a single row set.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { sets: vec![rows] }
    }

    /// Wrap several row sets.
    pub fn from_sets(sets: Vec<Vec<Row>>) -> Self {
        Self { sets }
    }

    /// Rows of the first set.
    pub fn rows(&self) -> &[Row] {
        self.sets.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// First row of the first set.
    pub fn first(&self) -> Option<&Row> {
        self.rows().first()
    }

    /// Number of rows in the first set.
    pub fn len(&self) -> usize {
        self.rows().len()
    }

    /// Returns `true` if the first set has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    /// All row sets.
    pub fn sets(&self) -> &[Vec<Row>] {
        &self.sets
    }

    /// Row set `index`, if present.
    pub fn set(&self, index: usize) -> Option<&[Row]> {
        self.sets.get(index).map(Vec::as_slice)
    }

    /// Take the rows of the first set.
    pub fn into_rows(self) -> Vec<Row> {
        self.sets.into_iter().next().unwrap_or_default()
    }

    /// Take all row sets.
    pub fn into_sets(self) -> Vec<Vec<Row>> {
        self.sets
    }

    /// Decode the first set into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> OrmResult<Vec<T>> {
        self.rows().iter().map(from_row).collect()
    }
}

impl Index<usize> for QueryResult {
    type Output = Row;

    fn index(&self, index: usize) -> &Row {
        &self.rows()[index]
    }
}

impl IntoIterator for QueryResult {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_rows().into_iter()
    }
}
