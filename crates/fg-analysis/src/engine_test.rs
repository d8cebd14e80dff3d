use super::*;
use crate::resolve::resolve_filters;
use crate::test_utils::{parse, rule};
use fg_core::config::CteResolution;
use fg_core::value::Operator;

fn run(sql: &str, rules: &[FilterRule]) -> ValidationResult {
    let tree = parse(sql);
    let analysis = QueryAnalysis::analyze(&tree, CteResolution::SingleHop);
    let index = RuleIndex::new(rules).unwrap();
    let groups = resolve_filters(&tree, &analysis, &index);
    evaluate(&index, &analysis, &groups)
}

#[test]
fn test_unused_table_is_skipped() {
    let result = run("SELECT * FROM products WHERE price > 100", &[rule("users", "deleted", 0)]);
    assert!(result.passed);
    assert!(result.validated_tables.is_empty());
    assert!(result.violations.is_empty());
}

#[test]
fn test_violation_fields() {
    let result = run(
        "SELECT * FROM users u WHERE u.deleted = 1 AND u.status = 'x'",
        &[rule("users", "deleted", 0)],
    );
    assert!(!result.passed);
    let violation = &result.violations[0];
    assert_eq!(violation.table_found_at, "level 0 as u");
    assert_eq!(violation.missing_filter, "deleted = 0");
    assert_eq!(violation.found_filters, vec!["u.deleted = 1".to_string()]);
    assert_eq!(
        violation.suggestion,
        "Add 'AND u.deleted = 0' to the WHERE clause"
    );
}

#[test]
fn test_suggestion_without_alias() {
    let result = run("SELECT * FROM users", &[rule("users", "deleted", 0)]);
    assert_eq!(
        result.violations[0].suggestion,
        "Add 'AND deleted = 0' to the WHERE clause"
    );
    assert_eq!(result.violations[0].table_found_at, "level 0");
    assert!(result.violations[0].found_filters.is_empty());
}

#[test]
fn test_self_join_reports_only_uncovered_occurrence() {
    let result = run(
        "SELECT * FROM users u1 JOIN users u2 ON u2.manager_id = u1.id WHERE u1.deleted = 0",
        &[rule("users", "deleted", 0)],
    );
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].table_found_at, "level 0 as u2");
}

#[test]
fn test_one_violation_per_rule() {
    let result = run(
        "SELECT * FROM users a JOIN users b ON a.id = b.id JOIN users c ON c.id = b.id",
        &[rule("users", "deleted", 0), rule("users", "is_test", 0)],
    );
    assert_eq!(result.violations.len(), 2);
    assert_eq!(
        result.violations[0].table_found_at,
        "level 0 as a, level 0 as b, level 0 as c"
    );
}

#[test]
fn test_table_usage_entries() {
    let result = run(
        "WITH au AS (SELECT * FROM users) SELECT * FROM au JOIN users x ON x.id = au.id",
        &[],
    );
    assert_eq!(
        result.table_usage.get("users"),
        Some(&vec!["level_1".to_string(), "level_0:x".to_string()])
    );
    assert_eq!(
        result.table_usage.get("au"),
        Some(&vec!["CTE:level_0:au".to_string()])
    );
}

#[test]
fn test_in_rule_requires_membership() {
    let rules = [rule("users", "status", "active").with_operator(Operator::In)];
    assert!(run("SELECT * FROM users WHERE status IN ('active', 'trial')", &rules).passed);
    assert!(!run("SELECT * FROM users WHERE status IN ('trial')", &rules).passed);
    assert!(!run("SELECT * FROM users WHERE status = 'active'", &rules).passed);
}

#[test]
fn test_range_rule() {
    let rules = [rule("events", "event_year", 2020).with_operator(Operator::GtEq)];
    assert!(run("SELECT * FROM events WHERE 2020 <= event_year", &rules).passed);
    assert!(!run("SELECT * FROM events WHERE event_year > 2020", &rules).passed);
}

#[test]
fn test_applied_filters_contain_every_group() {
    let result = run(
        "SELECT * FROM users u WHERE u.deleted = 0 AND u.status = 'x'",
        &[rule("users", "deleted", 0)],
    );
    let keys: Vec<_> = result.applied_filters.keys().cloned().collect();
    assert_eq!(keys, vec!["users.deleted".to_string(), "users.status".to_string()]);
}
