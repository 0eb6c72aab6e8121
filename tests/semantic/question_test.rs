//! Question answering: mention matching, grouping, joins and time phrases.

mod fixtures;

use fixtures::{sales, sales_with_costs, sales_with_regions, validate_sql, ALL_DIALECTS};
use quarry::compile::{answer_question, CompileOptions, QuestionOutput};
use quarry::model::Model;
use quarry::semantic::{CompileError, Warning};
use quarry::sql::Dialect;

fn ask(model: &Model, question: &str) -> Result<QuestionOutput, CompileError> {
    answer_question(model, question, &CompileOptions::default())
}

#[test]
fn test_revenue_by_country() {
    let output = ask(&sales(), "total revenue by country").unwrap();
    assert_eq!(output.matched_metrics, vec!["TotalRevenue"]);
    assert_eq!(output.matched_dimensions, vec!["CustomerCountry"]);
    assert!(output.warnings.is_empty());
    insta::assert_snapshot!(output.sql, @r#"
SELECT
  customers.country AS "CustomerCountry",
  SUM(orders.total_amount) AS "TotalRevenue"
FROM orders
LEFT OUTER JOIN customers ON orders.customer_id = customers.customer_id
GROUP BY customers.country
"#);
}

#[test]
fn test_matching_is_case_insensitive() {
    let output = ask(&sales(), "TOTAL REVENUE BY COUNTRY").unwrap();
    assert_eq!(output.matched_metrics, vec!["TotalRevenue"]);
    assert_eq!(output.matched_dimensions, vec!["CustomerCountry"]);
}

#[test]
fn test_join_through_intermediate_entity() {
    let output = ask(&sales_with_regions(), "total revenue by region name").unwrap();
    assert_eq!(output.matched_dimensions, vec!["RegionName"]);
    insta::assert_snapshot!(output.sql, @r#"
SELECT
  regions.region_name AS "RegionName",
  SUM(orders.total_amount) AS "TotalRevenue"
FROM orders
LEFT OUTER JOIN customers ON orders.customer_id = customers.customer_id
LEFT OUTER JOIN regions ON customers.region_id = regions.region_id
GROUP BY regions.region_name
"#);
}

#[test]
fn test_dimensions_only_are_distinct() {
    let output = ask(&sales(), "which country").unwrap();
    assert!(output.matched_metrics.is_empty());
    assert_eq!(
        output.sql,
        "SELECT DISTINCT\n  customers.country AS \"CustomerCountry\"\nFROM customers"
    );
}

#[test]
fn test_time_phrase_filters_date_dimension() {
    let output = ask(&sales(), "total revenue by order date last month").unwrap();
    assert_eq!(output.matched_dimensions, vec!["OrderDate"]);
    insta::assert_snapshot!(output.sql, @r#"
SELECT
  orders.order_date AS "OrderDate",
  SUM(orders.total_amount) AS "TotalRevenue"
FROM orders
WHERE orders.order_date >= DATE_TRUNC('month', CURRENT_DATE - INTERVAL '1 month') AND orders.order_date < DATE_TRUNC('month', CURRENT_DATE)
GROUP BY orders.order_date
ORDER BY orders.order_date ASC
"#);
}

#[test]
fn test_time_phrase_in_every_dialect() {
    for dialect in ALL_DIALECTS {
        let options = CompileOptions::default().with_dialect(dialect);
        let output = answer_question(&sales(), "total revenue by order date this year", &options)
            .unwrap();
        validate_sql(&output.sql, dialect);
    }
    let options = CompileOptions::default().with_dialect(Dialect::TSql);
    let sql = answer_question(&sales(), "total revenue by order date today", &options)
        .unwrap()
        .sql;
    assert!(sql.contains("WHERE [orders].[order_date] = CAST(GETDATE() AS DATE)"));
}

#[test]
fn test_time_phrase_without_date_dimension() {
    let output = ask(&sales(), "total revenue this month").unwrap();
    assert_eq!(
        output.warnings,
        vec![Warning::TimeFilterUnapplied {
            phrase: "this month".into()
        }]
    );
    assert!(!output.sql.contains("WHERE"));
}

#[test]
fn test_custom_date_indicators() {
    let options = CompileOptions::default().with_date_indicators(vec!["period".into()]);
    let output = answer_question(&sales(), "total revenue by order date today", &options).unwrap();
    assert_eq!(
        output.warnings,
        vec![Warning::TimeFilterUnapplied {
            phrase: "today".into()
        }]
    );
    assert!(!output.sql.contains("ORDER BY"));
}

#[test]
fn test_unreachable_entity_warns() {
    let output = ask(&sales_with_costs(), "total revenue and total cost").unwrap();
    assert_eq!(output.matched_metrics, vec!["TotalRevenue", "TotalCost"]);
    let expected = Warning::MultiSourceJoinUnresolved {
        context: "question".into(),
        joined: vec!["orders".into()],
        unjoined: vec!["costs".into()],
    };
    assert!(output
        .sql
        .contains(&format!("-- {}", expected)));
    assert_eq!(output.warnings, vec![expected]);
}

#[test]
fn test_calculated_metric_in_question() {
    let output = ask(&sales_with_costs(), "profit by country").unwrap();
    assert_eq!(output.matched_metrics, vec!["Profit"]);
    assert!(output
        .sql
        .contains("SUM(orders.total_amount) - SUM(costs.amount) AS \"Profit\""));
    assert!(output.sql.contains("GROUP BY customers.country"));
}

#[test]
fn test_orphaned_metric_ignored() {
    let mut m = sales();
    m.delete_entity("Customers").unwrap();
    let output = ask(&m, "total revenue by country").unwrap();
    assert_eq!(output.matched_dimensions, Vec::<String>::new());
    assert_eq!(
        output.warnings,
        vec![Warning::OrphanedMetricIgnored {
            metric: "CustomerCountry".into()
        }]
    );
    assert_eq!(
        output.sql,
        "SELECT\n  SUM(orders.total_amount) AS \"TotalRevenue\"\nFROM orders"
    );
}

#[test]
fn test_nothing_matched() {
    assert_eq!(
        ask(&sales(), "how many widgets shipped").unwrap_err(),
        CompileError::NoMetricsFound
    );
}

#[test]
fn test_cycle_in_matched_formula() {
    let mut m = sales();
    m.add_metric(quarry::model::Metric::calculated("Loop", "[Loop] + 1"))
        .unwrap();
    assert!(matches!(
        ask(&m, "loop"),
        Err(CompileError::CircularReference { .. })
    ));
}
