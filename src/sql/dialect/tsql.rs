//! T-SQL (SQL Server / Azure SQL) dialect.
//!
//! T-SQL differs from ANSI in the places the compiler touches:
//! - Square bracket identifier quoting (`[name]`)
//! - N'...' prefix for Unicode strings
//! - No `CURRENT_DATE`; today is `CAST(GETDATE() AS DATE)`
//! - `DATETRUNC` / `DATEADD` instead of `DATE_TRUNC` / `INTERVAL`

use super::helpers;
use super::SqlDialect;
use crate::sql::expr::DatePart;
use crate::sql::token::TokenStream;

/// T-SQL (SQL Server) dialect.
#[derive(Debug, Clone, Copy)]
pub struct TSql;

impl SqlDialect for TSql {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_bracket(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        if !s.is_ascii() {
            helpers::quote_string_unicode(s)
        } else {
            helpers::quote_string_single(s)
        }
    }

    fn current_date(&self) -> &'static str {
        "CAST(GETDATE() AS DATE)"
    }

    fn emit_date_trunc(&self, part: DatePart, arg: &TokenStream) -> TokenStream {
        helpers::emit_date_trunc_tsql(part, arg)
    }

    fn emit_date_sub(&self, arg: &TokenStream, amount: i64, part: DatePart) -> TokenStream {
        helpers::emit_date_sub_tsql(arg, amount, part)
    }
}
