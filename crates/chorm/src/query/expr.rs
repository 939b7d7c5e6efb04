//! Predicate expressions for WHERE / PREWHERE / HAVING.
//!
//! Values are rendered inline as ClickHouse literals by the grammar, so an
//! `Expr` is self-contained: no placeholder numbering is involved.

use crate::query::Builder;
use crate::value::Value;

/// How a condition attaches to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
    ILike,
    NotILike,
}

impl Op {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Like => "LIKE",
            Op::NotLike => "NOT LIKE",
            Op::ILike => "ILIKE",
            Op::NotILike => "NOT ILIKE",
        }
    }
}

/// Right-hand side of an `IN` predicate.
#[derive(Debug, Clone)]
pub enum InSource {
    /// Literal list.
    Values(Vec<Value>),
    /// A table (including temp tables shipped as external data).
    Table(String),
    /// A sub-query.
    Query(Box<Builder>),
}

/// Expression node for building conditions.
#[derive(Debug, Clone)]
pub enum Expr {
    /// AND group: all conditions must be true.
    And(Vec<Expr>),

    /// OR group: at least one condition must be true.
    Or(Vec<Expr>),

    /// NOT: negate the inner expression.
    Not(Box<Expr>),

    /// Simple comparison: column op literal
    Compare { column: String, op: Op, value: Value },

    /// NULL check: column IS NULL or column IS NOT NULL
    NullCheck { column: String, is_null: bool },

    /// column [GLOBAL] [NOT] IN (...)
    In {
        column: String,
        source: InSource,
        negated: bool,
        global: bool,
    },

    /// BETWEEN: column BETWEEN low AND high
    Between {
        column: String,
        from: Value,
        to: Value,
        negated: bool,
    },

    /// Raw SQL fragment.
    Raw(String),
}

impl Expr {
    /// Create an AND expression from a list of expressions.
    pub fn and(exprs: Vec<Expr>) -> Self {
        Expr::And(exprs)
    }

    /// Create an OR expression from a list of expressions.
    pub fn or(exprs: Vec<Expr>) -> Self {
        Expr::Or(exprs)
    }

    /// Create a NOT expression.
    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    /// Create a comparison: column op value
    pub fn compare(column: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Expr::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// column = value
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Op::Eq, value)
    }

    /// column != value
    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Op::Ne, value)
    }

    /// column > value
    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Op::Gt, value)
    }

    /// column >= value
    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Op::Gte, value)
    }

    /// column < value
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Op::Lt, value)
    }

    /// column <= value
    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Op::Lte, value)
    }

    /// column IS NULL
    pub fn is_null(column: impl Into<String>) -> Self {
        Expr::NullCheck {
            column: column.into(),
            is_null: true,
        }
    }

    /// column IS NOT NULL
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Expr::NullCheck {
            column: column.into(),
            is_null: false,
        }
    }

    /// column IN (values)
    pub fn in_list<V: Into<Value>>(column: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Expr::In {
            column: column.into(),
            source: InSource::Values(values.into_iter().map(Into::into).collect()),
            negated: false,
            global: false,
        }
    }

    /// column NOT IN (values)
    pub fn not_in_list<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Expr::In {
            column: column.into(),
            source: InSource::Values(values.into_iter().map(Into::into).collect()),
            negated: true,
            global: false,
        }
    }

    /// column BETWEEN from AND to
    pub fn between(column: impl Into<String>, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Expr::Between {
            column: column.into(),
            from: from.into(),
            to: to.into(),
            negated: false,
        }
    }

    /// column NOT BETWEEN from AND to
    pub fn not_between(
        column: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        Expr::Between {
            column: column.into(),
            from: from.into(),
            to: to.into(),
            negated: true,
        }
    }

    /// Raw SQL fragment, emitted as-is.
    ///
    /// **Warning**: bypasses literal escaping. Only use with trusted SQL.
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(sql.into())
    }
}

/// A condition in a WHERE / PREWHERE / HAVING list.
#[derive(Debug, Clone)]
pub struct Condition {
    pub(crate) conjunction: Conjunction,
    pub(crate) expr: Expr,
}

impl Condition {
    pub(crate) fn new(conjunction: Conjunction, expr: Expr) -> Self {
        Self { conjunction, expr }
    }
}
