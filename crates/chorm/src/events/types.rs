use std::fmt;
use std::time::Duration;

/// The kind of statement being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// SELECT query
    Select,
    /// INSERT statement
    Insert,
    /// ALTER statement (mutations)
    Alter,
    /// CREATE / DROP / TRUNCATE / RENAME
    Ddl,
    /// Anything else (SYSTEM, OPTIMIZE, SHOW, ...)
    Other,
}

impl QueryKind {
    /// Detect the statement kind from its first keyword.
    ///
    /// Leading whitespace, comments and parentheses are skipped, so
    /// `(SELECT 1) UNION ALL (SELECT 2)` is a select.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = strip_sql_prefix(sql);
        let keyword: String = trimmed
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_uppercase();

        match keyword.as_str() {
            "SELECT" | "WITH" => QueryKind::Select,
            "INSERT" => QueryKind::Insert,
            "ALTER" => QueryKind::Alter,
            "CREATE" | "DROP" | "TRUNCATE" | "RENAME" => QueryKind::Ddl,
            _ => QueryKind::Other,
        }
    }
}

fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if let Some(rest) = s.strip_prefix("--") {
            match rest.find('\n') {
                Some(pos) => {
                    s = &rest[pos + 1..];
                    continue;
                }
                None => return "",
            }
        }
        if let Some(rest) = s.strip_prefix("/*") {
            match rest.find("*/") {
                Some(pos) => {
                    s = &rest[pos + 2..];
                    continue;
                }
                None => return "",
            }
        }
        if let Some(rest) = s.strip_prefix('(') {
            s = rest;
            continue;
        }
        if s == before {
            break;
        }
    }
    s
}

/// Maximum length for error messages in `QueryOutcome::Error`.
const MAX_ERROR_LEN: usize = 512;

/// How a statement ended.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Query returned rows.
    Rows(usize),
    /// Statement completed without a result set.
    Done,
    /// Statement failed (message truncated to 512 bytes).
    Error(String),
}

impl QueryOutcome {
    /// Create an error outcome, truncating long messages.
    pub fn error(msg: String) -> Self {
        if msg.len() > MAX_ERROR_LEN {
            let truncated = super::truncate_sql_bytes(&msg, MAX_ERROR_LEN);
            Self::Error(format!("{truncated}..."))
        } else {
            Self::Error(msg)
        }
    }

    /// Returns `true` if the statement failed.
    pub fn is_error(&self) -> bool {
        matches!(self, QueryOutcome::Error(_))
    }
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutcome::Rows(n) => write!(f, "{n} rows"),
            QueryOutcome::Done => f.write_str("ok"),
            QueryOutcome::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// A statement executed by a connection.
#[derive(Debug, Clone)]
pub struct QueryEvent {
    /// Name of the connection that ran the statement.
    pub connection: String,
    /// SQL sent to the server (placeholders already substituted).
    pub sql: String,
    /// Number of values bound into the statement.
    pub bindings: usize,
    /// Detected statement kind.
    pub kind: QueryKind,
    /// Wall time from dispatch to response.
    pub duration: Duration,
    /// How the statement ended.
    pub outcome: QueryOutcome,
}

impl QueryEvent {
    /// Create an event; the kind is detected from `sql`.
    pub fn new(
        connection: impl Into<String>,
        sql: impl Into<String>,
        bindings: usize,
        duration: Duration,
        outcome: QueryOutcome,
    ) -> Self {
        let sql = sql.into();
        Self {
            connection: connection.into(),
            kind: QueryKind::from_sql(&sql),
            sql,
            bindings,
            duration,
            outcome,
        }
    }
}

/// Receives query lifecycle events from a connection.
pub trait EventDispatcher: Send + Sync {
    /// Called once per executed statement.
    fn dispatch(&self, event: &QueryEvent);
}

impl<F> EventDispatcher for F
where
    F: Fn(&QueryEvent) + Send + Sync,
{
    fn dispatch(&self, event: &QueryEvent) {
        self(event)
    }
}
