//! ANSI SQL dialect - the default rendering.
//!
//! Identifiers are left bare unless quoting is required, which keeps the
//! generated SQL readable (`SUM(orders.total_amount)`). Date helpers follow
//! the PostgreSQL spelling that most warehouses accept.

use super::helpers;
use super::SqlDialect;

/// ANSI SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Ansi;

impl SqlDialect for Ansi {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double_if_needed(ident)
    }
}
