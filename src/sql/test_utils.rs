//! sqlparser-backed checks for emitted SQL.

use sqlparser::dialect::{DuckDbDialect, GenericDialect, MsSqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

use super::dialect::Dialect;

/// Panic with the offending SQL unless it parses under `dialect`.
pub fn assert_parses(sql: &str, dialect: Dialect) {
    let parsed = match dialect {
        Dialect::Ansi => Parser::parse_sql(&GenericDialect {}, sql),
        Dialect::Postgres => Parser::parse_sql(&PostgreSqlDialect {}, sql),
        Dialect::DuckDb => Parser::parse_sql(&DuckDbDialect {}, sql),
        Dialect::TSql => Parser::parse_sql(&MsSqlDialect {}, sql),
    };
    if let Err(e) = parsed {
        panic!("{} rejected emitted SQL: {}\n{}", dialect, e, sql);
    }
}

#[test]
#[should_panic(expected = "rejected emitted SQL")]
fn test_garbage_is_rejected() {
    assert_parses("SELEC * FORM orders", Dialect::Postgres);
}
