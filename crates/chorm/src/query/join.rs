//! JOIN clauses.

use crate::query::Builder;
use crate::query::expr::Conjunction;
use std::fmt;

/// Join strictness: how multiple matches on the right side are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStrictness {
    /// Cartesian product of all matches.
    All,
    /// Only the first match.
    Any,
    /// Closest match (time-series joins).
    Asof,
    /// Semi join: left rows with at least one match.
    Semi,
    /// Anti join: left rows without a match.
    Anti,
}

impl JoinStrictness {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            JoinStrictness::All => "ALL",
            JoinStrictness::Any => "ANY",
            JoinStrictness::Asof => "ASOF",
            JoinStrictness::Semi => "SEMI",
            JoinStrictness::Anti => "ANTI",
        }
    }
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
            JoinKind::Full => "FULL",
            JoinKind::Cross => "CROSS",
        }
    }
}

/// What a join reads from.
#[derive(Debug, Clone)]
pub enum JoinTable {
    /// A table name.
    Table(String),
    /// A derived table.
    Query(Box<Builder>),
}

/// One `first op second` pair of an `ON` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOn {
    pub(crate) conjunction: Conjunction,
    pub(crate) first: String,
    pub(crate) op: String,
    pub(crate) second: String,
}

/// A JOIN clause under construction.
#[derive(Debug, Clone, Default)]
pub struct JoinClause {
    table: Option<JoinTable>,
    strictness: Option<JoinStrictness>,
    kind: Option<JoinKind>,
    distributed: bool,
    using: Vec<String>,
    on: Vec<JoinOn>,
    alias: Option<String>,
}

impl JoinClause {
    /// Create an empty join clause.
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a table by name.
    pub fn table(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = Some(JoinTable::Table(table.into()));
        self
    }

    /// Join a derived table.
    pub fn query(&mut self, query: Builder) -> &mut Self {
        self.table = Some(JoinTable::Query(Box::new(query)));
        self
    }

    /// Set strictness.
    pub fn strict(&mut self, strictness: JoinStrictness) -> &mut Self {
        self.strictness = Some(strictness);
        self
    }

    /// Set join type.
    pub fn kind(&mut self, kind: JoinKind) -> &mut Self {
        self.kind = Some(kind);
        self
    }

    /// Mark the join `GLOBAL`.
    pub fn distributed(&mut self, global: bool) -> &mut Self {
        self.distributed = global;
        self
    }

    /// Replace the `USING` column list.
    pub fn using<S: AsRef<str>>(&mut self, columns: &[S]) -> &mut Self {
        self.using = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    /// Append to the `USING` column list, skipping duplicates.
    pub fn add_using<S: AsRef<str>>(&mut self, columns: &[S]) -> &mut Self {
        for column in columns {
            let column = column.as_ref();
            if !self.using.iter().any(|c| c == column) {
                self.using.push(column.to_string());
            }
        }
        self
    }

    /// Add `ON first op second`, AND-ed with previous pairs.
    pub fn on(&mut self, first: impl Into<String>, op: impl Into<String>, second: impl Into<String>) -> &mut Self {
        self.push_on(Conjunction::And, first.into(), op.into(), second.into())
    }

    /// Add `ON first op second`, OR-ed with previous pairs.
    pub fn or_on(&mut self, first: impl Into<String>, op: impl Into<String>, second: impl Into<String>) -> &mut Self {
        self.push_on(Conjunction::Or, first.into(), op.into(), second.into())
    }

    fn push_on(&mut self, conjunction: Conjunction, first: String, op: String, second: String) -> &mut Self {
        self.on.push(JoinOn {
            conjunction,
            first,
            op,
            second,
        });
        self
    }

    /// Set an alias for the joined table.
    pub fn alias(&mut self, alias: impl Into<String>) -> &mut Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn get_table(&self) -> Option<&JoinTable> {
        self.table.as_ref()
    }

    /// Derived-table query, if the join reads from one.
    pub fn get_sub_query(&self) -> Option<&Builder> {
        match &self.table {
            Some(JoinTable::Query(query)) => Some(query),
            _ => None,
        }
    }

    pub fn get_strict(&self) -> Option<JoinStrictness> {
        self.strictness
    }

    pub fn get_kind(&self) -> Option<JoinKind> {
        self.kind
    }

    pub fn get_alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn get_using(&self) -> &[String] {
        &self.using
    }

    pub fn get_on(&self) -> &[JoinOn] {
        &self.on
    }

    pub fn is_distributed(&self) -> bool {
        self.distributed
    }
}

/// The first argument of [`Builder::join_raw`].
pub enum JoinTarget {
    /// Literal table name.
    Table(String),
    /// Derived table; its files are merged into the outer builder.
    Query(Builder),
    /// Callback that configures the join clause itself.
    Configure(Box<dyn FnOnce(&mut JoinClause)>),
}

impl JoinTarget {
    /// Build a target from a configuration callback.
    pub fn configure(f: impl FnOnce(&mut JoinClause) + 'static) -> Self {
        JoinTarget::Configure(Box::new(f))
    }
}

impl fmt::Debug for JoinTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinTarget::Table(table) => f.debug_tuple("Table").field(table).finish(),
            JoinTarget::Query(query) => f.debug_tuple("Query").field(query).finish(),
            JoinTarget::Configure(_) => f.write_str("Configure(..)"),
        }
    }
}

impl From<&str> for JoinTarget {
    fn from(table: &str) -> Self {
        JoinTarget::Table(table.to_string())
    }
}

impl From<String> for JoinTarget {
    fn from(table: String) -> Self {
        JoinTarget::Table(table)
    }
}

impl From<Builder> for JoinTarget {
    fn from(query: Builder) -> Self {
        JoinTarget::Query(query)
    }
}
