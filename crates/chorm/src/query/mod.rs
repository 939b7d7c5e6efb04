//! ClickHouse query builder.
//!
//! # Usage
//!
//! ```ignore
//! use chorm::query::{Direction, JoinKind, JoinStrictness, JoinTarget};
//!
//! let rows = conn
//!     .table("events")
//!     .select(&["user_id", "count() AS hits"])
//!     .any_left_join("users", &["user_id"])
//!     .prewhere_eq("site_id", 42)
//!     .where_between("date", "2024-01-01", "2024-01-31")
//!     .group_by(&["user_id"])
//!     .order_by("hits", Direction::Desc)
//!     .limit(10)
//!     .get()
//!     .await?;
//!
//! // Raw join with a callback-configured clause
//! let q = conn.table("events").join_raw(
//!     JoinTarget::configure(|join| {
//!         join.table("sessions").on("events.session_id", "=", "sessions.id");
//!     }),
//!     Some(JoinStrictness::All),
//!     Some(JoinKind::Inner),
//!     None,
//!     true,
//!     Some("s"),
//! );
//!
//! // INSERT
//! conn.table("events")
//!     .insert(vec![
//!         Record::new().set("id", 1).set("name", "a"),
//!         Record::new().set("name", "b").set("id", 2),
//!     ])
//!     .await?;
//! ```

mod builder;
mod expr;
mod join;
mod result;

#[cfg(test)]
mod tests;

pub use builder::{
    ArrayJoin, Builder, DEFAULT_INSERT_CONCURRENCY, Direction, FromClause, FromSource, LimitBy,
};
pub use expr::{Condition, Conjunction, Expr, InSource, Op};
pub use join::{JoinClause, JoinKind, JoinOn, JoinStrictness, JoinTable, JoinTarget};
pub use result::QueryResult;
