//! Convenient imports for typical `chorm` usage.
//!
//! ```ignore
//! use chorm::prelude::*;
//! ```

pub use crate::{
    Builder, Connection, ConnectionConfig, DatabaseConfig, DatabaseManager, Direction, Expr,
    Format, JoinKind, JoinStrictness, JoinTarget, Op, OrmError, OrmResult, QueryResult, Record,
    Row, TempTable, Value,
};
