//! Relative time phrases recognized in questions.

use crate::sql::{current_date, date_sub, date_trunc, DatePart, Expr, ExprExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativePeriod {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisYear,
    LastYear,
}

impl RelativePeriod {
    pub const ALL: [RelativePeriod; 8] = [
        RelativePeriod::Today,
        RelativePeriod::Yesterday,
        RelativePeriod::ThisWeek,
        RelativePeriod::LastWeek,
        RelativePeriod::ThisMonth,
        RelativePeriod::LastMonth,
        RelativePeriod::ThisYear,
        RelativePeriod::LastYear,
    ];

    pub fn phrase(self) -> &'static str {
        match self {
            RelativePeriod::Today => "today",
            RelativePeriod::Yesterday => "yesterday",
            RelativePeriod::ThisWeek => "this week",
            RelativePeriod::LastWeek => "last week",
            RelativePeriod::ThisMonth => "this month",
            RelativePeriod::LastMonth => "last month",
            RelativePeriod::ThisYear => "this year",
            RelativePeriod::LastYear => "last year",
        }
    }

    /// Every phrase found in `text` (already lowercased).
    pub fn find_all(text: &str) -> Vec<RelativePeriod> {
        Self::ALL
            .into_iter()
            .filter(|p| text.contains(p.phrase()))
            .collect()
    }

    /// Predicate restricting `column` to this period.
    pub fn predicate(self, column: Expr) -> Expr {
        match self {
            RelativePeriod::Today => column.eq(current_date()),
            RelativePeriod::Yesterday => column.eq(date_sub(current_date(), 1, DatePart::Day)),
            RelativePeriod::ThisWeek => column.gte(date_trunc(DatePart::Week, current_date())),
            RelativePeriod::ThisMonth => column.gte(date_trunc(DatePart::Month, current_date())),
            RelativePeriod::ThisYear => column.gte(date_trunc(DatePart::Year, current_date())),
            RelativePeriod::LastWeek => previous(column, DatePart::Week, 7, DatePart::Day),
            RelativePeriod::LastMonth => previous(column, DatePart::Month, 1, DatePart::Month),
            RelativePeriod::LastYear => previous(column, DatePart::Year, 1, DatePart::Year),
        }
    }
}

/// `column >= trunc(today - step) AND column < trunc(today)`
fn previous(column: Expr, part: DatePart, amount: i64, unit: DatePart) -> Expr {
    let start = date_trunc(part, date_sub(current_date(), amount, unit));
    let end = date_trunc(part, current_date());
    column.clone().gte(start).and(column.lt(end))
}
