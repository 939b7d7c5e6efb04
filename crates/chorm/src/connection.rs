//! ClickHouse connection: executes compiled statements and reports them to
//! an optional event dispatcher.

use crate::config::ConnectionConfig;
use crate::error::{OrmError, OrmResult};
use crate::events::{EventDispatcher, QueryEvent, QueryOutcome};
use crate::format::Format;
use crate::grammar::Grammar;
use crate::query::Builder;
use crate::temp_table::TempTable;
use crate::transport::{HttpTransport, Query, Transport};
use crate::value::{Row, Value, bind_params};
use futures_util::{StreamExt, TryStreamExt, stream};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of uploading one file in [`Connection::insert_files`].
#[derive(Debug)]
pub struct FileInsertResult {
    /// File that was uploaded.
    pub path: PathBuf,
    /// Upload result.
    pub result: OrmResult<()>,
}

impl FileInsertResult {
    /// Returns `true` if the file was inserted.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// A named ClickHouse connection.
///
/// Cheap to clone: configuration, transport and dispatcher are shared.
#[derive(Clone)]
pub struct Connection {
    config: Arc<ConnectionConfig>,
    transport: Arc<dyn Transport>,
    dispatcher: Option<Arc<dyn EventDispatcher>>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.config.name)
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("database", &self.config.database)
            .field("has_dispatcher", &self.dispatcher.is_some())
            .finish()
    }
}

impl Connection {
    /// Create a connection over the HTTP interface.
    pub fn new(config: ConnectionConfig) -> OrmResult<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a connection over a custom transport.
    pub fn with_transport(config: ConnectionConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            dispatcher: None,
        }
    }

    /// Connection name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Connection configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Attach an event dispatcher; every executed statement is reported to it.
    pub fn set_event_dispatcher(&mut self, dispatcher: Arc<dyn EventDispatcher>) {
        self.dispatcher = Some(dispatcher);
    }

    /// Currently attached dispatcher.
    pub fn event_dispatcher(&self) -> Option<&Arc<dyn EventDispatcher>> {
        self.dispatcher.as_ref()
    }

    /// Start an empty query builder on this connection.
    pub fn query(&self) -> Builder {
        Builder::new(self.clone(), Grammar)
    }

    /// Start a query builder selecting from `table`.
    pub fn table(&self, table: impl Into<String>) -> Builder {
        self.query().from(table)
    }

    /// Run a query, substituting `?` placeholders with `bindings`.
    pub async fn select(
        &self,
        sql: &str,
        bindings: &[Value],
        files: &[TempTable],
    ) -> OrmResult<Vec<Row>> {
        let sql = bind_statement(sql, bindings)?;
        let start = Instant::now();
        let result = self.transport.select(&sql, files).await;
        self.fire(&sql, bindings.len(), start.elapsed(), rows_outcome(&result));
        result
    }

    /// Run several queries concurrently.
    ///
    /// Row sets come back in submission order. At most
    /// `async_concurrency` statements are in flight; the first failure
    /// aborts the whole call.
    pub async fn select_async(&self, queries: Vec<Query>) -> OrmResult<Vec<Vec<Row>>> {
        let concurrency = self.config.async_concurrency.max(1);
        stream::iter(queries)
            .map(|query| async move { self.select(&query.sql, &[], &query.files).await })
            .buffered(concurrency)
            .try_collect::<Vec<_>>()
            .await
    }

    /// Run an INSERT with `?` placeholders bound to `bindings`.
    pub async fn insert(&self, sql: &str, bindings: &[Value]) -> OrmResult<bool> {
        let sql = bind_statement(sql, bindings)?;
        let start = Instant::now();
        let result = self.transport.execute(&sql).await;
        self.fire(&sql, bindings.len(), start.elapsed(), done_outcome(&result));
        result.map(|()| true)
    }

    /// Run a statement without a result set (DDL, ALTER, OPTIMIZE, ...).
    pub async fn statement(&self, sql: &str) -> OrmResult<bool> {
        let start = Instant::now();
        let result = self.transport.execute(sql).await;
        self.fire(sql, 0, start.elapsed(), done_outcome(&result));
        result.map(|()| true)
    }

    /// Bulk-load local files into `table`.
    ///
    /// Each file is uploaded as the body of `INSERT INTO table (columns) FORMAT format`
    /// with at most `concurrency` uploads running at once. One result per file is
    /// returned in input order; a failed upload does not stop the others.
    pub async fn insert_files(
        &self,
        table: &str,
        columns: &[&str],
        files: Vec<PathBuf>,
        format: Format,
        concurrency: usize,
    ) -> OrmResult<Vec<FileInsertResult>> {
        if table.is_empty() {
            return Err(OrmError::validation("insert_files requires a target table"));
        }
        let sql = Grammar.compile_insert_format(table, columns, format);
        let sql = sql.as_str();

        let results = stream::iter(files)
            .map(|path| async move {
                let start = Instant::now();
                let result = self.transport.insert_file(sql, &path).await;
                self.fire(sql, 0, start.elapsed(), done_outcome(&result));
                FileInsertResult { path, result }
            })
            .buffered(concurrency.max(1))
            .collect::<Vec<_>>()
            .await;
        Ok(results)
    }

    fn fire(&self, sql: &str, bindings: usize, duration: Duration, outcome: QueryOutcome) {
        if let Some(dispatcher) = &self.dispatcher {
            let event = QueryEvent::new(self.name(), sql, bindings, duration, outcome);
            dispatcher.dispatch(&event);
        }
    }
}

fn bind_statement(sql: &str, bindings: &[Value]) -> OrmResult<String> {
    if bindings.is_empty() {
        Ok(sql.to_string())
    } else {
        bind_params(sql, bindings)
    }
}

fn rows_outcome(result: &OrmResult<Vec<Row>>) -> QueryOutcome {
    match result {
        Ok(rows) => QueryOutcome::Rows(rows.len()),
        Err(e) => QueryOutcome::error(e.to_string()),
    }
}

fn done_outcome(result: &OrmResult<()>) -> QueryOutcome {
    match result {
        Ok(()) => QueryOutcome::Done,
        Err(e) => QueryOutcome::error(e.to_string()),
    }
}
