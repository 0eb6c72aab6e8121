//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for SQL dialect differences.
//! Each dialect implements `SqlDialect` to handle its specific syntax:
//!
//! - Identifier quoting: bare-when-safe (ANSI), `"` (PG/DuckDB), `[]` (T-SQL)
//! - Today's date: `CURRENT_DATE` vs `CAST(GETDATE() AS DATE)`
//! - Date truncation and subtraction used by relative time filters
//!
//! # Usage
//!
//! ```
//! use quarry::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Postgres;
//! assert_eq!(dialect.quote_identifier("user"), "\"user\"");
//! ```

mod ansi;
mod duckdb;
pub mod helpers;
mod postgres;
mod tsql;

pub use ansi::Ansi;
pub use duckdb::DuckDb;
pub use postgres::Postgres;
pub use tsql::TSql;

use serde::{Deserialize, Serialize};

use super::expr::DatePart;
use super::token::TokenStream;

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// Implementations handle dialect-specific syntax differences.
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    ///
    /// All dialects use single quotes with `''` for escaping.
    /// Override for Unicode prefix (T-SQL N'...').
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    // =========================================================================
    // Date/Time
    // =========================================================================

    /// Expression for the current date.
    fn current_date(&self) -> &'static str {
        "CURRENT_DATE"
    }

    /// Truncate `arg` to the start of its `part` (week, month, year...).
    fn emit_date_trunc(&self, part: DatePart, arg: &TokenStream) -> TokenStream {
        helpers::emit_date_trunc_standard(part, arg)
    }

    /// Subtract `amount` units of `part` from `arg`.
    fn emit_date_sub(&self, arg: &TokenStream, amount: i64, part: DatePart) -> TokenStream {
        helpers::emit_date_sub_standard(arg, amount, part)
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Ansi,
    Postgres,
    DuckDb,
    TSql,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Ansi => &Ansi,
            Dialect::Postgres => &Postgres,
            Dialect::DuckDb => &DuckDb,
            Dialect::TSql => &TSql,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn current_date(&self) -> &'static str {
        self.dialect().current_date()
    }

    fn emit_date_trunc(&self, part: DatePart, arg: &TokenStream) -> TokenStream {
        self.dialect().emit_date_trunc(part, arg)
    }

    fn emit_date_sub(&self, arg: &TokenStream, amount: i64, part: DatePart) -> TokenStream {
        self.dialect().emit_date_sub(arg, amount, part)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}
