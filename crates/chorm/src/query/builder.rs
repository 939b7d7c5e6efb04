//! ClickHouse SELECT builder with execution helpers.

use crate::connection::{Connection, FileInsertResult};
use crate::error::{OrmError, OrmResult};
use crate::format::Format;
use crate::grammar::Grammar;
use crate::query::expr::{Condition, Conjunction, Expr, InSource, Op};
use crate::query::join::{JoinClause, JoinKind, JoinStrictness, JoinTarget};
use crate::query::result::QueryResult;
use crate::temp_table::TempTable;
use crate::transport::Query;
use crate::value::{InsertValues, Record, Row, Value};
use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Default number of concurrent uploads for [`Builder::insert_files`].
pub const DEFAULT_INSERT_CONCURRENCY: usize = 5;

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// FROM source.
#[derive(Debug, Clone)]
pub enum FromSource {
    Table(String),
    Query(Box<Builder>),
}

/// FROM clause with ClickHouse modifiers.
#[derive(Debug, Clone)]
pub struct FromClause {
    pub(crate) source: FromSource,
    pub(crate) alias: Option<String>,
    pub(crate) final_: bool,
    pub(crate) sample: Option<f64>,
}

/// `ARRAY JOIN` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayJoin {
    pub(crate) expression: String,
    pub(crate) left: bool,
}

/// `LIMIT n BY columns` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitBy {
    pub(crate) limit: u64,
    pub(crate) columns: Vec<String>,
}

/// Query builder bound to a connection.
///
/// Builders are consumed by their chaining methods and executed with
/// [`get`](Builder::get), [`count`](Builder::count), [`first`](Builder::first),
/// [`insert`](Builder::insert) or [`insert_files`](Builder::insert_files).
#[derive(Debug, Clone)]
pub struct Builder {
    connection: Connection,
    grammar: Grammar,
    pub(crate) columns: Vec<String>,
    pub(crate) from: Option<FromClause>,
    pub(crate) array_join: Option<ArrayJoin>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) prewheres: Vec<Condition>,
    pub(crate) wheres: Vec<Condition>,
    pub(crate) groups: Vec<String>,
    pub(crate) havings: Vec<Condition>,
    pub(crate) orders: Vec<String>,
    pub(crate) limit_by: Option<LimitBy>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) unions: Vec<Builder>,
    pub(crate) async_queries: Vec<Builder>,
    pub(crate) files: Vec<TempTable>,
}

impl Builder {
    /// Create an empty builder.
    pub fn new(connection: Connection, grammar: Grammar) -> Self {
        Self {
            connection,
            grammar,
            columns: Vec::new(),
            from: None,
            array_join: None,
            joins: Vec::new(),
            prewheres: Vec::new(),
            wheres: Vec::new(),
            groups: Vec::new(),
            havings: Vec::new(),
            orders: Vec::new(),
            limit_by: None,
            limit: None,
            offset: None,
            unions: Vec::new(),
            async_queries: Vec::new(),
            files: Vec::new(),
        }
    }

    /// A fresh builder on the same connection and grammar.
    pub fn new_query(&self) -> Builder {
        Builder::new(self.connection.clone(), self.grammar)
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    // ==================== SELECT columns ====================

    /// Replace the SELECT list.
    pub fn select<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    /// Append one SELECT expression.
    pub fn add_select(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    // ==================== FROM ====================

    /// Select from a table.
    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.from = Some(FromClause {
            source: FromSource::Table(table.into()),
            alias: None,
            final_: false,
            sample: None,
        });
        self
    }

    /// Select from a derived table. The sub-query's files are merged.
    pub fn from_query(mut self, query: Builder) -> Self {
        self.merge_files(&query.files);
        self.from = Some(FromClause {
            source: FromSource::Query(Box::new(query)),
            alias: None,
            final_: false,
            sample: None,
        });
        self
    }

    /// Alias the FROM source.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        if let Some(from) = self.from.as_mut() {
            from.alias = Some(alias.into());
        }
        self
    }

    /// Add the `FINAL` modifier.
    pub fn with_final(mut self) -> Self {
        if let Some(from) = self.from.as_mut() {
            from.final_ = true;
        }
        self
    }

    /// Add `SAMPLE ratio`.
    pub fn sample(mut self, ratio: f64) -> Self {
        if let Some(from) = self.from.as_mut() {
            from.sample = Some(ratio);
        }
        self
    }

    /// Table name of the FROM clause, if it is a plain table.
    pub fn table_name(&self) -> Option<&str> {
        match self.from.as_ref().map(|f| &f.source) {
            Some(FromSource::Table(table)) => Some(table),
            _ => None,
        }
    }

    // ==================== JOIN ====================

    /// `ARRAY JOIN expression`.
    pub fn array_join(mut self, expression: impl Into<String>) -> Self {
        self.array_join = Some(ArrayJoin {
            expression: expression.into(),
            left: false,
        });
        self
    }

    /// `LEFT ARRAY JOIN expression`.
    pub fn left_array_join(mut self, expression: impl Into<String>) -> Self {
        self.array_join = Some(ArrayJoin {
            expression: expression.into(),
            left: true,
        });
        self
    }

    /// Add a JOIN clause.
    ///
    /// `target` is a table name, a derived-table [`Builder`] (its files are
    /// merged into this builder) or [`JoinTarget::configure`] to set the
    /// clause up in a callback. `using` is appended to whatever the callback
    /// set. `strict`, `kind` and `alias` only apply when the callback left
    /// them unset.
    pub fn join_raw(
        mut self,
        target: impl Into<JoinTarget>,
        strict: Option<JoinStrictness>,
        kind: Option<JoinKind>,
        using: Option<&[&str]>,
        global: bool,
        alias: Option<&str>,
    ) -> Self {
        let mut join = JoinClause::new();

        match target.into() {
            JoinTarget::Query(query) => {
                self.merge_files(&query.files);
                join.query(query);
            }
            JoinTarget::Configure(configure) => configure(&mut join),
            JoinTarget::Table(table) => {
                join.table(table);
            }
        }

        if let Some(using) = using {
            join.add_using(using);
        }
        if let Some(strict) = strict
            && join.get_strict().is_none()
        {
            join.strict(strict);
        }
        if let Some(kind) = kind
            && join.get_kind().is_none()
        {
            join.kind(kind);
        }
        if let Some(alias) = alias
            && join.get_alias().is_none()
        {
            join.alias(alias);
        }
        join.distributed(global);

        self.joins.push(join);
        self
    }

    /// Join with explicit strictness and type on `USING` columns.
    pub fn join(
        self,
        target: impl Into<JoinTarget>,
        strict: JoinStrictness,
        kind: JoinKind,
        using: &[&str],
        global: bool,
    ) -> Self {
        self.join_raw(target, Some(strict), Some(kind), Some(using), global, None)
    }

    /// `ANY LEFT JOIN ... USING (...)`
    pub fn any_left_join(self, target: impl Into<JoinTarget>, using: &[&str]) -> Self {
        self.join(target, JoinStrictness::Any, JoinKind::Left, using, false)
    }

    /// `ALL LEFT JOIN ... USING (...)`
    pub fn all_left_join(self, target: impl Into<JoinTarget>, using: &[&str]) -> Self {
        self.join(target, JoinStrictness::All, JoinKind::Left, using, false)
    }

    /// `ANY INNER JOIN ... USING (...)`
    pub fn any_inner_join(self, target: impl Into<JoinTarget>, using: &[&str]) -> Self {
        self.join(target, JoinStrictness::Any, JoinKind::Inner, using, false)
    }

    /// `ALL INNER JOIN ... USING (...)`
    pub fn all_inner_join(self, target: impl Into<JoinTarget>, using: &[&str]) -> Self {
        self.join(target, JoinStrictness::All, JoinKind::Inner, using, false)
    }

    /// `LEFT JOIN ... USING (...)` with server-default strictness.
    pub fn left_join(self, target: impl Into<JoinTarget>, using: &[&str]) -> Self {
        self.join_raw(target, None, Some(JoinKind::Left), Some(using), false, None)
    }

    /// `INNER JOIN ... USING (...)` with server-default strictness.
    pub fn inner_join(self, target: impl Into<JoinTarget>, using: &[&str]) -> Self {
        self.join_raw(target, None, Some(JoinKind::Inner), Some(using), false, None)
    }

    // ==================== WHERE ====================

    /// Add a WHERE expression (AND).
    pub fn where_expr(mut self, expr: Expr) -> Self {
        self.wheres.push(Condition::new(Conjunction::And, expr));
        self
    }

    /// Add a WHERE expression (OR).
    pub fn or_where_expr(mut self, expr: Expr) -> Self {
        self.wheres.push(Condition::new(Conjunction::Or, expr));
        self
    }

    /// WHERE column op value
    pub fn where_op(self, column: &str, op: Op, value: impl Into<Value>) -> Self {
        self.where_expr(Expr::compare(column, op, value))
    }

    /// OR column op value
    pub fn or_where_op(self, column: &str, op: Op, value: impl Into<Value>) -> Self {
        self.or_where_expr(Expr::compare(column, op, value))
    }

    /// WHERE column = value
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_op(column, Op::Eq, value)
    }

    /// OR column = value
    pub fn or_where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.or_where_op(column, Op::Eq, value)
    }

    /// WHERE column IN (values)
    pub fn where_in<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.where_expr(Expr::in_list(column, values))
    }

    /// WHERE column NOT IN (values)
    pub fn where_not_in<V: Into<Value>>(
        self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.where_expr(Expr::not_in_list(column, values))
    }

    /// WHERE column IN (sub-query). The sub-query's files are merged.
    pub fn where_in_query(mut self, column: &str, query: Builder) -> Self {
        self.merge_files(&query.files);
        self.where_expr(Expr::In {
            column: column.to_string(),
            source: InSource::Query(Box::new(query)),
            negated: false,
            global: false,
        })
    }

    /// WHERE column GLOBAL IN (sub-query), for distributed tables.
    pub fn where_global_in_query(mut self, column: &str, query: Builder) -> Self {
        self.merge_files(&query.files);
        self.where_expr(Expr::In {
            column: column.to_string(),
            source: InSource::Query(Box::new(query)),
            negated: false,
            global: true,
        })
    }

    /// WHERE column IN temp_table, shipping the file with the query.
    pub fn where_in_file(mut self, column: &str, table: TempTable) -> Self {
        let name = table.name().to_string();
        self = self.add_file(table);
        self.where_expr(Expr::In {
            column: column.to_string(),
            source: InSource::Table(name),
            negated: false,
            global: false,
        })
    }

    /// WHERE column BETWEEN from AND to
    pub fn where_between(self, column: &str, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        self.where_expr(Expr::between(column, from, to))
    }

    /// WHERE column IS NULL
    pub fn where_null(self, column: &str) -> Self {
        self.where_expr(Expr::is_null(column))
    }

    /// WHERE column IS NOT NULL
    pub fn where_not_null(self, column: &str) -> Self {
        self.where_expr(Expr::is_not_null(column))
    }

    /// WHERE raw SQL (AND).
    pub fn where_raw(self, sql: impl Into<String>) -> Self {
        self.where_expr(Expr::raw(sql))
    }

    /// WHERE raw SQL (OR).
    pub fn or_where_raw(self, sql: impl Into<String>) -> Self {
        self.or_where_expr(Expr::raw(sql))
    }

    // ==================== PREWHERE ====================

    /// Add a PREWHERE expression (AND).
    pub fn prewhere_expr(mut self, expr: Expr) -> Self {
        self.prewheres.push(Condition::new(Conjunction::And, expr));
        self
    }

    /// PREWHERE column op value
    pub fn prewhere_op(self, column: &str, op: Op, value: impl Into<Value>) -> Self {
        self.prewhere_expr(Expr::compare(column, op, value))
    }

    /// PREWHERE column = value
    pub fn prewhere_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.prewhere_op(column, Op::Eq, value)
    }

    /// PREWHERE raw SQL.
    pub fn prewhere_raw(self, sql: impl Into<String>) -> Self {
        self.prewhere_expr(Expr::raw(sql))
    }

    // ==================== GROUP BY / HAVING ====================

    /// GROUP BY columns (appended).
    pub fn group_by<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.groups.extend(columns.iter().map(|c| c.as_ref().to_string()));
        self
    }

    /// Add a HAVING expression (AND).
    pub fn having_expr(mut self, expr: Expr) -> Self {
        self.havings.push(Condition::new(Conjunction::And, expr));
        self
    }

    /// HAVING column op value
    pub fn having_op(self, column: &str, op: Op, value: impl Into<Value>) -> Self {
        self.having_expr(Expr::compare(column, op, value))
    }

    /// HAVING raw SQL.
    pub fn having_raw(self, sql: impl Into<String>) -> Self {
        self.having_expr(Expr::raw(sql))
    }

    // ==================== ORDER / LIMIT ====================

    /// ORDER BY column direction
    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        let dir = match direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        self.orders.push(format!("{column} {dir}"));
        self
    }

    /// ORDER BY column DESC
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, Direction::Desc)
    }

    /// ORDER BY raw expression
    pub fn order_by_raw(mut self, sql: impl Into<String>) -> Self {
        self.orders.push(sql.into());
        self
    }

    /// LIMIT n BY columns
    pub fn limit_by<S: AsRef<str>>(mut self, limit: u64, columns: &[S]) -> Self {
        self.limit_by = Some(LimitBy {
            limit,
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        });
        self
    }

    /// LIMIT n
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// OFFSET n
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    // ==================== UNION / ASYNC / FILES ====================

    /// UNION ALL with another query. Its files are merged.
    pub fn union_all(mut self, query: Builder) -> Self {
        self.merge_files(&query.files);
        self.unions.push(query);
        self
    }

    /// Run `query` concurrently with this one; [`get`](Builder::get) then
    /// returns one row set per statement.
    pub fn async_with_query(mut self, query: Builder) -> Self {
        self.async_queries.push(query);
        self
    }

    /// Ship a local file with this query as a temp table.
    ///
    /// Temp tables are keyed by name: a file with an already registered
    /// name replaces the earlier one in place.
    pub fn add_file(mut self, table: TempTable) -> Self {
        self.put_file(table);
        self
    }

    fn put_file(&mut self, table: TempTable) {
        match self.files.iter_mut().find(|f| f.name() == table.name()) {
            Some(existing) => *existing = table,
            None => self.files.push(table),
        }
    }

    fn merge_files(&mut self, files: &[TempTable]) {
        for file in files {
            self.put_file(file.clone());
        }
    }

    /// Files referenced by this query.
    pub fn get_files(&self) -> &[TempTable] {
        &self.files
    }

    pub fn get_joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn get_groups(&self) -> &[String] {
        &self.groups
    }

    // ==================== Compilation ====================

    /// Compile this query (without its async companions).
    pub fn to_sql(&self) -> String {
        self.grammar.compile_select(self)
    }

    /// This query followed by every async query, expanded recursively.
    pub fn to_async_queries(&self) -> Vec<Query> {
        let mut queries = vec![Query::new(self.to_sql()).with_files(self.files.clone())];
        for query in &self.async_queries {
            queries.extend(query.to_async_queries());
        }
        queries
    }

    /// `SELECT count(column) AS count` over this query's source and filters.
    ///
    /// Columns, limits and async queries are dropped; ORDER BY is kept only
    /// when the query is grouped.
    pub fn count_query(&self, column: &str) -> Builder {
        let mut query = self.clone();
        query.columns = vec![format!("count({column}) AS count")];
        query.limit = None;
        query.offset = None;
        query.limit_by = None;
        query.async_queries.clear();
        if query.groups.is_empty() {
            query.orders.clear();
        }
        query
    }

    /// Compile an INSERT for `values`: SQL with `?` placeholders plus the
    /// flattened values in column order. `None` when there is nothing to insert.
    ///
    /// Every row's columns are sorted so all tuples share one column order.
    pub fn insert_statement(
        &self,
        values: impl Into<InsertValues>,
    ) -> OrmResult<Option<(String, Vec<Value>)>> {
        let values = values.into();
        if values.is_empty() {
            return Ok(None);
        }

        let mut records = values.into_records();
        for record in &mut records {
            record.sort_columns();
        }

        let sql = self.grammar.compile_insert(self, &records)?;
        let bindings = records.into_iter().flat_map(Record::into_values).collect();
        Ok(Some((sql, bindings)))
    }

    // ==================== Execution ====================

    /// Run the query.
    ///
    /// With async queries attached, every statement is sent concurrently and
    /// the result holds one row set per statement in submission order.
    pub async fn get(&self) -> OrmResult<QueryResult> {
        if !self.async_queries.is_empty() {
            let sets = self.connection.select_async(self.to_async_queries()).await?;
            Ok(QueryResult::from_sets(sets))
        } else {
            let rows = self
                .connection
                .select(&self.to_sql(), &[], &self.files)
                .await?;
            Ok(QueryResult::from_rows(rows))
        }
    }

    /// Run the query and decode the first row set into `T`.
    pub async fn get_as<T: DeserializeOwned>(&self) -> OrmResult<Vec<T>> {
        self.get().await?.decode()
    }

    /// Run the query and return its first row.
    pub async fn first(&self) -> OrmResult<Option<Row>> {
        Ok(self.get().await?.into_rows().into_iter().next())
    }

    /// Count rows matching this query.
    ///
    /// Grouped queries count groups. Otherwise the `count` column of the
    /// first row is read, falling back to 0 when it is missing.
    pub async fn count(&self, column: &str) -> OrmResult<u64> {
        let result = self.count_query(column).get().await?;

        if !self.groups.is_empty() {
            return Ok(result.len() as u64);
        }

        Ok(result
            .first()
            .and_then(|row| row.get("count"))
            .and_then(count_value)
            .unwrap_or(0))
    }

    /// Insert rows into the FROM table.
    ///
    /// Returns `Ok(false)` without contacting the server when `values` is empty.
    pub async fn insert(&self, values: impl Into<InsertValues>) -> OrmResult<bool> {
        match self.insert_statement(values)? {
            Some((sql, bindings)) => self.connection.insert(&sql, &bindings).await,
            None => Ok(false),
        }
    }

    /// Bulk-load local files into the FROM table.
    pub async fn insert_files<S: AsRef<str>>(
        &self,
        columns: &[S],
        files: Vec<PathBuf>,
        format: Format,
        concurrency: usize,
    ) -> OrmResult<Vec<FileInsertResult>> {
        let table = self
            .table_name()
            .ok_or_else(|| OrmError::validation("insert_files requires a FROM table"))?;
        let columns: Vec<&str> = columns.iter().map(AsRef::as_ref).collect();
        self.connection
            .insert_files(table, &columns, files, format, concurrency)
            .await
    }

    /// [`insert_files`](Builder::insert_files) with CSV and the default concurrency.
    pub async fn insert_csv_files<S: AsRef<str>>(
        &self,
        columns: &[S],
        files: Vec<PathBuf>,
    ) -> OrmResult<Vec<FileInsertResult>> {
        self.insert_files(columns, files, Format::Csv, DEFAULT_INSERT_CONCURRENCY)
            .await
    }
}

/// ClickHouse quotes 64-bit integers in JSON output by default.
fn count_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
