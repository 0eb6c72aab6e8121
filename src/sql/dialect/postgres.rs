//! PostgreSQL dialect.
//!
//! - Double-quote identifier quoting, always applied
//! - `DATE_TRUNC` and `INTERVAL` arithmetic (trait defaults)

use super::helpers;
use super::SqlDialect;

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }
}
