//! # chorm
//!
//! A ClickHouse query builder and HTTP connection layer for Rust.
//!
//! ## Features
//!
//! - **ClickHouse dialect**: `FINAL`, `SAMPLE`, `PREWHERE`, `ARRAY JOIN`, `LIMIT n BY`,
//!   `GLOBAL` joins with `ALL`/`ANY`/`ASOF` strictness
//! - **Async fan-out**: attach companion queries and get one row set per statement
//! - **Bulk loading**: value inserts with a consistent column order, and file uploads
//!   with bounded concurrency
//! - **External data**: ship local files with a query as temporary tables
//! - **Named connections**: resolve connections from TOML config via the
//!   `clickhouse-ext` driver, with query events for logging
//!
//! ## Example
//!
//! ```ignore
//! use chorm::{Connection, ConnectionConfig, Record};
//!
//! let conn = Connection::new(ConnectionConfig::new().host("localhost"))?;
//!
//! conn.table("events")
//!     .insert(vec![
//!         Record::new().set("b", 2).set("a", 1),
//!         Record::new().set("a", 3).set("b", 4),
//!     ])
//!     .await?;
//!
//! let total = conn.table("events").where_eq("a", 1).count("*").await?;
//! let first = conn.table("events").first().await?;
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod format;
pub mod grammar;
pub mod manager;
pub mod prelude;
pub mod query;
pub mod temp_table;
pub mod transport;
pub mod value;

pub use config::{ConnectionConfig, DatabaseConfig};
pub use connection::{Connection, FileInsertResult};
pub use error::{OrmError, OrmResult};
pub use events::{EventDispatcher, QueryEvent, QueryKind, QueryOutcome, TracingDispatcher};
pub use format::Format;
pub use grammar::Grammar;
pub use manager::{DRIVER_NAME, DatabaseManager};
pub use query::{
    Builder, Direction, Expr, JoinClause, JoinKind, JoinStrictness, JoinTarget, Op, QueryResult,
};
pub use temp_table::TempTable;
pub use transport::{HttpTransport, Query, Transport};
pub use value::{InsertValues, Record, Row, Value};
