//! ClickHouse SQL grammar: turns builder state into statement text.

use crate::error::{OrmError, OrmResult};
use crate::format::Format;
use crate::query::{
    Builder, Condition, Expr, FromClause, FromSource, InSource, JoinClause, JoinTable,
};
use crate::value::{Record, to_literal};

/// Compiles builders into ClickHouse SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grammar;

impl Grammar {
    /// Compile a SELECT, including any UNION ALL parts.
    ///
    /// Clause order: `SELECT`, `FROM [AS] [FINAL] [SAMPLE]`, `ARRAY JOIN`,
    /// joins, `PREWHERE`, `WHERE`, `GROUP BY`, `HAVING`, `ORDER BY`,
    /// `LIMIT n BY`, `LIMIT`, `OFFSET`.
    pub fn compile_select(&self, query: &Builder) -> String {
        let mut parts: Vec<String> = Vec::new();

        let columns = if query.columns.is_empty() {
            "*".to_string()
        } else {
            query.columns.join(", ")
        };
        parts.push(format!("SELECT {columns}"));

        if let Some(from) = &query.from {
            parts.push(self.compile_from(from));
        }

        if let Some(array_join) = &query.array_join {
            let prefix = if array_join.left { "LEFT ARRAY JOIN" } else { "ARRAY JOIN" };
            parts.push(format!("{prefix} {}", array_join.expression));
        }

        for join in &query.joins {
            parts.push(self.compile_join(join));
        }

        if !query.prewheres.is_empty() {
            parts.push(format!("PREWHERE {}", self.compile_conditions(&query.prewheres)));
        }

        if !query.wheres.is_empty() {
            parts.push(format!("WHERE {}", self.compile_conditions(&query.wheres)));
        }

        if !query.groups.is_empty() {
            parts.push(format!("GROUP BY {}", query.groups.join(", ")));
        }

        if !query.havings.is_empty() {
            parts.push(format!("HAVING {}", self.compile_conditions(&query.havings)));
        }

        if !query.orders.is_empty() {
            parts.push(format!("ORDER BY {}", query.orders.join(", ")));
        }

        if let Some(limit_by) = &query.limit_by {
            parts.push(format!("LIMIT {} BY {}", limit_by.limit, limit_by.columns.join(", ")));
        }

        if let Some(limit) = query.limit {
            parts.push(format!("LIMIT {limit}"));
        }

        if let Some(offset) = query.offset {
            parts.push(format!("OFFSET {offset}"));
        }

        let mut sql = parts.join(" ");
        for union in &query.unions {
            sql.push_str(" UNION ALL ");
            sql.push_str(&self.compile_select(union));
        }
        sql
    }

    fn compile_from(&self, from: &FromClause) -> String {
        let mut sql = match &from.source {
            FromSource::Table(table) => format!("FROM {table}"),
            FromSource::Query(query) => format!("FROM ({})", self.compile_select(query)),
        };
        if let Some(alias) = &from.alias {
            sql.push_str(&format!(" AS {alias}"));
        }
        if from.final_ {
            sql.push_str(" FINAL");
        }
        if let Some(sample) = from.sample {
            sql.push_str(&format!(" SAMPLE {sample}"));
        }
        sql
    }

    /// Compile one JOIN clause:
    /// `[GLOBAL] [strictness] [kind] JOIN target [AS alias] [USING (...) | ON ...]`.
    pub fn compile_join(&self, join: &JoinClause) -> String {
        let mut words: Vec<String> = Vec::new();
        if join.is_distributed() {
            words.push("GLOBAL".to_string());
        }
        if let Some(strict) = join.get_strict() {
            words.push(strict.as_sql().to_string());
        }
        if let Some(kind) = join.get_kind() {
            words.push(kind.as_sql().to_string());
        }
        words.push("JOIN".to_string());

        match join.get_table() {
            Some(JoinTable::Table(table)) => words.push(table.clone()),
            Some(JoinTable::Query(query)) => words.push(format!("({})", self.compile_select(query))),
            None => {}
        }

        if let Some(alias) = join.get_alias() {
            words.push(format!("AS {alias}"));
        }

        if !join.get_using().is_empty() {
            words.push(format!("USING ({})", join.get_using().join(", ")));
        } else if !join.get_on().is_empty() {
            let mut on = String::new();
            for (i, pair) in join.get_on().iter().enumerate() {
                if i > 0 {
                    on.push(' ');
                    on.push_str(pair.conjunction.as_sql());
                    on.push(' ');
                }
                on.push_str(&format!("{} {} {}", pair.first, pair.op, pair.second));
            }
            words.push(format!("ON {on}"));
        }

        words.join(" ")
    }

    fn compile_conditions(&self, conditions: &[Condition]) -> String {
        let mut sql = String::new();
        for (i, condition) in conditions.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(condition.conjunction.as_sql());
                sql.push(' ');
            }
            sql.push_str(&self.compile_expr(&condition.expr));
        }
        sql
    }

    /// Compile a predicate, rendering values as literals.
    pub fn compile_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::And(exprs) => self.compile_group(exprs, " AND ", "1"),
            Expr::Or(exprs) => self.compile_group(exprs, " OR ", "0"),
            Expr::Not(inner) => format!("NOT ({})", self.compile_expr(inner)),
            Expr::Compare { column, op, value } => {
                format!("{column} {} {}", op.as_sql(), to_literal(value))
            }
            Expr::NullCheck { column, is_null } => {
                if *is_null {
                    format!("{column} IS NULL")
                } else {
                    format!("{column} IS NOT NULL")
                }
            }
            Expr::In {
                column,
                source,
                negated,
                global,
            } => {
                let op = match (global, negated) {
                    (false, false) => "IN",
                    (false, true) => "NOT IN",
                    (true, false) => "GLOBAL IN",
                    (true, true) => "GLOBAL NOT IN",
                };
                match source {
                    // Empty lists are constant predicates.
                    InSource::Values(values) if values.is_empty() => {
                        if *negated { "1" } else { "0" }.to_string()
                    }
                    InSource::Values(values) => {
                        let list: Vec<String> = values.iter().map(to_literal).collect();
                        format!("{column} {op} ({})", list.join(", "))
                    }
                    InSource::Table(table) => format!("{column} {op} {table}"),
                    InSource::Query(query) => {
                        format!("{column} {op} ({})", self.compile_select(query))
                    }
                }
            }
            Expr::Between {
                column,
                from,
                to,
                negated,
            } => {
                let op = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                format!("{column} {op} {} AND {}", to_literal(from), to_literal(to))
            }
            Expr::Raw(sql) => sql.clone(),
        }
    }

    fn compile_group(&self, exprs: &[Expr], sep: &str, empty: &str) -> String {
        match exprs {
            [] => empty.to_string(),
            [single] => self.compile_expr(single),
            _ => {
                let inner: Vec<String> = exprs.iter().map(|e| self.compile_expr(e)).collect();
                format!("({})", inner.join(sep))
            }
        }
    }

    /// Compile `INSERT INTO table (columns) VALUES (?, ...), ...` for
    /// records whose columns are already sorted.
    ///
    /// Every record must carry the same columns as the first one.
    pub fn compile_insert(&self, query: &Builder, records: &[Record]) -> OrmResult<String> {
        let table = query
            .table_name()
            .ok_or_else(|| OrmError::validation("insert requires a FROM table"))?;

        let Some(first) = records.first() else {
            return Err(OrmError::validation("insert requires at least one row"));
        };
        let columns: Vec<&str> = first.keys().collect();
        if columns.is_empty() {
            return Err(OrmError::validation("insert rows must have at least one column"));
        }

        for (i, record) in records.iter().enumerate().skip(1) {
            if !record.keys().eq(columns.iter().copied()) {
                return Err(OrmError::validation(format!(
                    "insert row {i} has columns ({}), expected ({})",
                    record.keys().collect::<Vec<_>>().join(", "),
                    columns.join(", ")
                )));
            }
        }

        let tuple = format!("({})", vec!["?"; columns.len()].join(", "));
        let tuples = vec![tuple.as_str(); records.len()].join(", ");
        Ok(format!(
            "INSERT INTO {table} ({}) VALUES {tuples}",
            columns.join(", ")
        ))
    }

    /// Compile the statement a file upload is sent with.
    pub fn compile_insert_format(&self, table: &str, columns: &[&str], format: Format) -> String {
        if columns.is_empty() {
            format!("INSERT INTO {table} FORMAT {format}")
        } else {
            format!("INSERT INTO {table} ({}) FORMAT {format}", columns.join(", "))
        }
    }
}
