use super::truncate_sql_bytes;
use super::types::{EventDispatcher, QueryEvent};
use tracing::Level;

/// A `tracing`-based dispatcher that logs every executed statement.
///
/// Failed statements are always logged at `WARN`; everything else uses the
/// configured level (`DEBUG` by default).
#[derive(Debug, Clone)]
pub struct TracingDispatcher {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingDispatcher {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl TracingDispatcher {
    /// Create a new dispatcher with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

impl EventDispatcher for TracingDispatcher {
    fn dispatch(&self, event: &QueryEvent) {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(&event.sql);
        let level = if event.outcome.is_error() {
            Level::WARN
        } else {
            self.level
        };
        emit_at_level!(
            level,
            target: "chorm.sql",
            connection = %event.connection,
            kind = ?event.kind,
            bindings = event.bindings,
            elapsed_ms = event.duration.as_millis() as u64,
            outcome = %event.outcome,
            sql = %sql,
        );
    }
}
