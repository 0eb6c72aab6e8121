//! SQL generation module.
//!
//! This module provides a type-safe SQL builder that generates multi-dialect SQL.
//! It includes:
//!
//! - [`query`] - SELECT query builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    avg, col, count, count_distinct, current_date, date_sub, date_trunc, lit_null, max, min,
    raw_sql, sum, table_col, BinaryOperator, DatePart, Expr, ExprExt,
};
pub use query::{Cte, Join, JoinType, OrderByExpr, Query, SelectExpr, TableRef};
pub use token::{Keyword, Token, TokenStream};
