//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use super::super::expr::{BinaryOperator, DatePart};
use super::super::token::{Token, TokenStream};

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Keywords that force quoting under the bare-identifier style.
const RESERVED: &[&str] = &[
    "all", "and", "as", "asc", "by", "case", "date", "day", "desc", "distinct", "else", "end",
    "from", "group", "having", "in", "inner", "is", "join", "left", "like", "limit", "month",
    "not", "null", "on", "or", "order", "outer", "right", "select", "table", "then", "time",
    "timestamp", "to", "union", "user", "when", "where", "with", "year",
];

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres, DuckDB
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with square brackets.
/// Used by: T-SQL (SQL Server, Azure Synapse)
pub fn quote_bracket(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

/// Leave simple lower-case identifiers bare, double-quote everything else.
/// Used by: Ansi
///
/// An identifier stays bare when it starts with a lower-case letter or `_`,
/// contains only lower-case ASCII letters, digits and `_`, and is not a
/// reserved word. Mixed-case names are quoted so their case survives folding.
pub fn quote_double_if_needed(ident: &str) -> String {
    if is_bare_identifier(ident) {
        ident.to_string()
    } else {
        quote_double(ident)
    }
}

fn is_bare_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_lowercase() || first == '_') {
        return false;
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return false;
    }
    !RESERVED.contains(&ident)
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
/// Used by: All dialects
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote string with N prefix for Unicode (T-SQL).
/// Used by: T-SQL for non-ASCII strings
pub fn quote_string_unicode(s: &str) -> String {
    format!("N'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Date Arithmetic
// =============================================================================

/// `INTERVAL '7 days'` style literal.
pub fn interval_literal(amount: i64, part: DatePart) -> String {
    let unit = part.as_str();
    if amount == 1 {
        format!("INTERVAL '{} {}'", amount, unit)
    } else {
        format!("INTERVAL '{} {}s'", amount, unit)
    }
}

/// Emit `DATE_TRUNC('month', arg)`.
/// Used by: Ansi, Postgres, DuckDB
pub fn emit_date_trunc_standard(part: DatePart, arg: &TokenStream) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName("date_trunc".into()))
        .lparen()
        .push(Token::Str(part.as_str().into()))
        .comma()
        .space()
        .append(arg)
        .rparen();
    ts
}

/// Emit `arg - INTERVAL 'n unit'`.
/// Used by: Ansi, Postgres, DuckDB
pub fn emit_date_sub_standard(arg: &TokenStream, amount: i64, part: DatePart) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.append(arg)
        .space()
        .push(Token::Operator(BinaryOperator::Minus))
        .space()
        .push(Token::Raw(interval_literal(amount, part)));
    ts
}

/// Emit `DATETRUNC(month, arg)` (SQL Server 2022+).
pub fn emit_date_trunc_tsql(part: DatePart, arg: &TokenStream) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName("datetrunc".into()))
        .lparen()
        .push(Token::Raw(part.as_str().into()))
        .comma()
        .space()
        .append(arg)
        .rparen();
    ts
}

/// Emit `DATEADD(month, -n, arg)`.
pub fn emit_date_sub_tsql(arg: &TokenStream, amount: i64, part: DatePart) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName("dateadd".into()))
        .lparen()
        .push(Token::Raw(part.as_str().into()))
        .comma()
        .space()
        .push(Token::Int(-amount))
        .comma()
        .space()
        .append(arg)
        .rparen();
    ts
}
