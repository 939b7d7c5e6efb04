//! Values, rows and ClickHouse literal rendering.
//!
//! Result rows arrive as `JSONEachRow` objects, so values are plain
//! [`serde_json::Value`]s. Outgoing values are rendered as ClickHouse
//! literals, either inline by the grammar or by substituting `?`
//! placeholders in [`bind_params`].

use crate::error::{OrmError, OrmResult};
use serde::de::DeserializeOwned;

/// A single ClickHouse value.
pub type Value = serde_json::Value;

/// A result row: column name to value.
pub type Row = serde_json::Map<String, Value>;

/// Decode a result row into a typed struct.
pub fn from_row<T: DeserializeOwned>(row: &Row) -> OrmResult<T> {
    serde_json::from_value(Value::Object(row.clone())).map_err(|e| OrmError::decode(e.to_string()))
}

/// One row of an INSERT payload.
///
/// Columns keep the order they were set in until [`Record::sort_columns`]
/// normalizes them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    columns: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value. Setting the same column twice replaces the value.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a column value in place.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some((_, v)) => *v = value,
            None => self.columns.push((column, value)),
        }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if no column is set.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in current order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    /// Values in current column order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.columns.iter().map(|(_, v)| v)
    }

    /// Look up a value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    /// Sort columns lexicographically by name.
    pub fn sort_columns(&mut self) {
        self.columns.sort_by(|a, b| a.0.cmp(&b.0));
    }

    pub(crate) fn into_values(self) -> impl Iterator<Item = Value> {
        self.columns.into_iter().map(|(_, v)| v)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl From<Row> for Record {
    fn from(row: Row) -> Self {
        row.into_iter().collect()
    }
}

/// INSERT payload: one record or a batch.
#[derive(Clone, Debug, PartialEq)]
pub enum InsertValues {
    /// A bare single row.
    One(Record),
    /// A batch of rows.
    Many(Vec<Record>),
}

impl InsertValues {
    /// Returns `true` if there is nothing to insert.
    pub fn is_empty(&self) -> bool {
        match self {
            InsertValues::One(record) => record.is_empty(),
            InsertValues::Many(records) => records.is_empty(),
        }
    }

    /// Normalize to a batch.
    pub fn into_records(self) -> Vec<Record> {
        match self {
            InsertValues::One(record) => vec![record],
            InsertValues::Many(records) => records,
        }
    }
}

impl From<Record> for InsertValues {
    fn from(record: Record) -> Self {
        InsertValues::One(record)
    }
}

impl From<Vec<Record>> for InsertValues {
    fn from(records: Vec<Record>) -> Self {
        InsertValues::Many(records)
    }
}

impl From<Row> for InsertValues {
    fn from(row: Row) -> Self {
        InsertValues::One(row.into())
    }
}

impl From<Vec<Row>> for InsertValues {
    fn from(rows: Vec<Row>) -> Self {
        InsertValues::Many(rows.into_iter().map(Record::from).collect())
    }
}

impl TryFrom<Value> for InsertValues {
    type Error = OrmError;

    /// Accepts a JSON object (one row) or an array of objects (batch).
    fn try_from(value: Value) -> OrmResult<Self> {
        match value {
            Value::Object(row) => Ok(InsertValues::One(row.into())),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(row) => Ok(Record::from(row)),
                    other => Err(OrmError::validation(format!(
                        "insert rows must be objects, got {other}"
                    ))),
                })
                .collect::<OrmResult<Vec<_>>>()
                .map(InsertValues::Many),
            other => Err(OrmError::validation(format!(
                "insert payload must be an object or array of objects, got {other}"
            ))),
        }
    }
}

/// Escape a string for use inside single quotes.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render a value as a ClickHouse literal.
///
/// Arrays become `[...]`; objects are rendered as a `Map` literal.
pub fn to_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", escape_string(s)),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(to_literal).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("'{}', {}", escape_string(k), to_literal(v)))
                .collect();
            format!("map({})", inner.join(", "))
        }
    }
}

/// Substitute `?` placeholders with literal values.
///
/// Question marks inside quoted strings or backtick identifiers are left
/// alone. The number of placeholders must match the number of values.
pub fn bind_params(sql: &str, params: &[Value]) -> OrmResult<String> {
    let mut out = String::with_capacity(sql.len() + params.len() * 4);
    let mut params_iter = params.iter();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut placeholders = 0usize;

    for ch in sql.chars() {
        if let Some(q) = quote {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' | '`' => {
                quote = Some(ch);
                out.push(ch);
            }
            '?' => {
                placeholders += 1;
                match params_iter.next() {
                    Some(value) => out.push_str(&to_literal(value)),
                    None => {
                        return Err(OrmError::validation(format!(
                            "statement has more placeholders than the {} bound values",
                            params.len()
                        )));
                    }
                }
            }
            _ => out.push(ch),
        }
    }

    if placeholders != params.len() {
        return Err(OrmError::validation(format!(
            "statement has {placeholders} placeholders but {} values were bound",
            params.len()
        )));
    }
    Ok(out)
}
