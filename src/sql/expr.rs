//! Expression AST - the core of SQL expression building.
//!
//! This module provides a strongly-typed AST for SQL expressions
//! with exhaustive pattern matching enforced by the compiler.

use super::dialect::{Dialect, SqlDialect};
use super::token::{Keyword, Token, TokenStream};

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
///
/// Every variant must be handled in `to_tokens_for_dialect()` - the compiler enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: optional_table.column
    Column {
        table: Option<String>,
        column: String,
    },

    /// `NULL`
    Null,

    /// Binary operation: left op right
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// Function call: name(args...)
    Function {
        name: String,
        args: Vec<Expr>,
        distinct: bool,
    },

    /// Parenthesized expression
    Paren(Box<Expr>),

    /// Pieces rendered back to back with no separators.
    ///
    /// Calculated metric formulas expand into this: the operator text the
    /// author wrote stays as `Raw` parts and every `[Metric]` reference is
    /// replaced by the referenced metric's own expression.
    Formula(Vec<Expr>),

    /// Today's date in the target dialect.
    CurrentDate,

    /// Truncate a date to the start of its week, month, quarter or year.
    DateTrunc { part: DatePart, expr: Box<Expr> },

    /// `expr` minus `amount` units of `part`.
    DateSub {
        expr: Box<Expr>,
        amount: i64,
        part: DatePart,
    },

    /// Raw SQL expression passed directly to output without escaping.
    ///
    /// # Security Warning
    ///
    /// **Never pass user input to this variant.** Raw SQL is not sanitized.
    /// Only use with trusted fragments such as the operator text of a
    /// calculated metric, which has already been parsed and checked.
    Raw(String),
}

/// Operators the builders emit. Formula arithmetic stays in raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    Lt,
    Gte,
    And,
    Minus,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gte => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Minus => "-",
        }
    }
}

/// Calendar unit used by date truncation and interval arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatePart {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl DatePart {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatePart::Day => "day",
            DatePart::Week => "week",
            DatePart::Month => "month",
            DatePart::Quarter => "quarter",
            DatePart::Year => "year",
        }
    }
}

impl Expr {
    /// Convert this expression to a token stream (default dialect).
    pub fn to_tokens(&self) -> TokenStream {
        self.to_tokens_for_dialect(Dialect::default())
    }

    /// Convert this expression to a token stream for a specific dialect.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column { table, column } => {
                if let Some(t) = table {
                    ts.ident(t).push(Token::Dot);
                }
                ts.ident(column);
            }

            Expr::Null => {
                ts.push(Token::Null);
            }

            Expr::BinaryOp { left, op, right } => {
                ts.append(&left.to_tokens_for_dialect(dialect));
                ts.space();
                ts.push(Token::Operator(*op));
                ts.space();
                ts.append(&right.to_tokens_for_dialect(dialect));
            }

            Expr::Function {
                name,
                args,
                distinct,
            } => {
                ts.push(Token::FunctionName(name.clone()));
                ts.lparen();
                if *distinct {
                    ts.keyword(Keyword::Distinct).space();
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&arg.to_tokens_for_dialect(dialect));
                }
                ts.rparen();
            }

            Expr::Paren(inner) => {
                ts.lparen();
                ts.append(&inner.to_tokens_for_dialect(dialect));
                ts.rparen();
            }

            Expr::Formula(parts) => {
                for part in parts {
                    ts.append(&part.to_tokens_for_dialect(dialect));
                }
            }

            Expr::CurrentDate => {
                ts.push(Token::CurrentDate);
            }

            Expr::DateTrunc { part, expr } => {
                let arg = expr.to_tokens_for_dialect(dialect);
                ts.append(&dialect.emit_date_trunc(*part, &arg));
            }

            Expr::DateSub { expr, amount, part } => {
                let arg = expr.to_tokens_for_dialect(dialect);
                ts.append(&dialect.emit_date_sub(&arg, *amount, *part));
            }

            Expr::Raw(sql) => {
                ts.push(Token::Raw(sql.clone()));
            }
        }

        ts
    }
}

// =============================================================================
// Builder Functions
// =============================================================================

/// Create an unqualified column reference.
pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        column: name.into(),
    }
}

/// Create a qualified column reference: table.column
pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        column: column.into(),
    }
}

pub fn lit_null() -> Expr {
    Expr::Null
}

/// One-argument aggregate call.
fn aggregate_call(name: &str, arg: Expr, distinct: bool) -> Expr {
    Expr::Function {
        name: name.into(),
        args: vec![arg],
        distinct,
    }
}

pub fn sum(expr: Expr) -> Expr {
    aggregate_call("SUM", expr, false)
}

pub fn avg(expr: Expr) -> Expr {
    aggregate_call("AVG", expr, false)
}

pub fn min(expr: Expr) -> Expr {
    aggregate_call("MIN", expr, false)
}

pub fn max(expr: Expr) -> Expr {
    aggregate_call("MAX", expr, false)
}

pub fn count(expr: Expr) -> Expr {
    aggregate_call("COUNT", expr, false)
}

/// COUNT(DISTINCT expr)
pub fn count_distinct(expr: Expr) -> Expr {
    aggregate_call("COUNT", expr, true)
}

pub fn current_date() -> Expr {
    Expr::CurrentDate
}

pub fn date_trunc(part: DatePart, expr: Expr) -> Expr {
    Expr::DateTrunc {
        part,
        expr: Box::new(expr),
    }
}

pub fn date_sub(expr: Expr, amount: i64, part: DatePart) -> Expr {
    Expr::DateSub {
        expr: Box::new(expr),
        amount,
        part,
    }
}

/// Raw SQL fragment.
///
/// # Security Warning
///
/// **Never pass user input to this function.** See [`Expr::Raw`].
pub fn raw_sql(sql: &str) -> Expr {
    Expr::Raw(sql.into())
}

// =============================================================================
// Expression Builder Trait
// =============================================================================

/// Extension trait for building expressions fluently.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    fn binary(self, op: BinaryOperator, other: Expr) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op,
            right: Box::new(other),
        }
    }

    fn eq(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::Eq, other)
    }

    fn gte(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::Gte, other)
    }

    fn lt(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::Lt, other)
    }

    fn and(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::And, other)
    }

    fn paren(self) -> Expr {
        Expr::Paren(Box::new(self.into_expr()))
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}
