//! Query lifecycle events.
//!
//! A [`Connection`](crate::Connection) with an attached [`EventDispatcher`]
//! emits one [`QueryEvent`] for every statement it sends, whether it
//! succeeded or not.
//!
//! # Example
//!
//! ```rust,ignore
//! use chorm::events::{CompositeDispatcher, TracingDispatcher};
//! use std::sync::Arc;
//!
//! let mut conn = chorm::Connection::new(config)?;
//! conn.set_event_dispatcher(Arc::new(TracingDispatcher::new()));
//! ```

mod dispatchers;
mod tracing_dispatcher;
mod types;

#[cfg(test)]
mod tests;

pub use dispatchers::{CollectingDispatcher, CompositeDispatcher, NoopDispatcher};
pub use tracing_dispatcher::TracingDispatcher;
pub use types::{EventDispatcher, QueryEvent, QueryKind, QueryOutcome};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
