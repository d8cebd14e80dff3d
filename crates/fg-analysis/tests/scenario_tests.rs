//! End-to-end validation scenarios

use fg_analysis::test_utils::{rule, users_deleted_rule, validate};
use fg_core::value::Operator;
use std::collections::BTreeSet;

fn users_only(sql: &str) -> fg_analysis::ValidationResult {
    validate(vec![users_deleted_rule()], sql)
}

fn tables(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ── Core scenarios ──────────────────────────────────────────────────────

#[test]
fn test_filter_present_passes() {
    let result = users_only("SELECT * FROM users WHERE deleted = 0");
    assert!(result.passed);
    assert_eq!(result.validated_tables, tables(&["users"]));
}

#[test]
fn test_filter_missing_fails() {
    let result = users_only("SELECT * FROM users WHERE status = 'active'");
    assert!(!result.passed);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].missing_filter, "deleted = 0");
    assert_eq!(result.violations[0].rule.column_name, "deleted");
}

#[test]
fn test_rule_table_unused_passes() {
    let result = users_only("SELECT * FROM products WHERE price > 100");
    assert!(result.passed);
    assert!(result.validated_tables.is_empty());
}

#[test]
fn test_second_joined_table_unfiltered() {
    let result = validate(
        vec![rule("users", "deleted", 0), rule("posts", "deleted", 0)],
        "SELECT * FROM users u, posts p WHERE u.id = p.user_id AND u.deleted = 0",
    );
    assert!(!result.passed);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].rule.table_name, "posts");
}

#[test]
fn test_filter_inside_cte_body() {
    let result = users_only("WITH au AS (SELECT * FROM users WHERE deleted = 0) SELECT * FROM au");
    assert!(result.passed);
    assert!(result.validated_tables.contains("users"));
}

#[test]
fn test_not_equal_does_not_satisfy_equality() {
    assert!(!users_only("SELECT * FROM users WHERE deleted != 1").passed);
    assert!(!users_only("SELECT * FROM users WHERE deleted <> 1").passed);
}

// ── Same-level filters ──────────────────────────────────────────────────

#[test]
fn test_alias_filter() {
    assert!(users_only("SELECT * FROM users u WHERE u.deleted = 0").passed);
}

#[test]
fn test_wrong_value_fails() {
    let result = users_only("SELECT * FROM users WHERE deleted = 1");
    assert!(!result.passed);
    assert_eq!(result.violations.len(), 1);
}

#[test]
fn test_filter_among_other_conditions() {
    assert!(users_only(
        "SELECT * FROM users u WHERE u.status = 'active' AND u.deleted = 0 AND u.created_at > '2024-01-01'"
    )
    .passed);
}

// ── JOIN clauses ────────────────────────────────────────────────────────

#[test]
fn test_filter_in_join_on() {
    assert!(users_only(
        "SELECT * FROM orders o JOIN users u ON u.id = o.user_id AND u.deleted = 0"
    )
    .passed);
}

#[test]
fn test_filter_in_join_without_alias() {
    assert!(users_only(
        "SELECT * FROM orders JOIN users ON users.id = orders.user_id AND users.deleted = 0"
    )
    .passed);
}

#[test]
fn test_join_filtered_in_where() {
    assert!(users_only(
        "SELECT * FROM orders o JOIN users u ON u.id = o.user_id WHERE u.deleted = 0"
    )
    .passed);
}

#[test]
fn test_multiple_joins_each_filtered() {
    let result = validate(
        vec![rule("users", "deleted", 0), rule("accounts", "is_test", 0)],
        "SELECT * FROM orders o \
         JOIN users u ON u.id = o.user_id AND u.deleted = 0 \
         JOIN accounts a ON a.id = u.account_id AND a.is_test = 0",
    );
    assert!(result.passed);
    assert_eq!(result.validated_tables, tables(&["accounts", "users"]));
}

// ── CTEs ────────────────────────────────────────────────────────────────

#[test]
fn test_filter_outside_cte() {
    assert!(users_only(
        "WITH all_users AS (SELECT * FROM users) SELECT * FROM all_users WHERE deleted = 0"
    )
    .passed);
}

#[test]
fn test_cte_without_filter_fails() {
    let result = users_only(
        "WITH active_users AS (SELECT * FROM users WHERE status = 'active') \
         SELECT * FROM active_users",
    );
    assert!(!result.passed);
    assert_eq!(result.violations[0].table_found_at, "level 1");
}

#[test]
fn test_chained_ctes() {
    assert!(users_only(
        "WITH base_users AS (SELECT * FROM users), \
              filtered_users AS (SELECT * FROM base_users WHERE deleted = 0) \
         SELECT * FROM filtered_users"
    )
    .passed);
}

#[test]
fn test_multiple_ctes_over_different_tables() {
    let result = validate(
        vec![rule("users", "deleted", 0), rule("accounts", "is_test", 0)],
        "WITH active_users AS (SELECT * FROM users WHERE deleted = 0), \
              real_accounts AS (SELECT * FROM accounts WHERE is_test = 0) \
         SELECT * FROM active_users u JOIN real_accounts a ON u.account_id = a.id",
    );
    assert!(result.passed);
}

#[test]
fn test_cte_qualifier_filters_outer_query() {
    assert!(users_only(
        "WITH au AS (SELECT * FROM users) SELECT * FROM au WHERE au.deleted = 0"
    )
    .passed);
    assert!(users_only(
        "WITH au AS (SELECT * FROM users) SELECT * FROM au x WHERE x.deleted = 0"
    )
    .passed);
}

// ── Subqueries ──────────────────────────────────────────────────────────

#[test]
fn test_filter_in_derived_table() {
    assert!(users_only("SELECT * FROM (SELECT * FROM users WHERE deleted = 0) AS active").passed);
}

#[test]
fn test_filter_outside_derived_table() {
    assert!(users_only("SELECT * FROM (SELECT * FROM users) AS all_users WHERE deleted = 0").passed);
}

#[test]
fn test_filter_outside_nested_derived_tables() {
    assert!(users_only(
        "SELECT * FROM (SELECT * FROM (SELECT * FROM users) AS inner_q) AS outer_q WHERE deleted = 0"
    )
    .passed);
}

#[test]
fn test_derived_table_in_join() {
    assert!(users_only(
        "SELECT * FROM orders o JOIN (SELECT * FROM users WHERE deleted = 0) u ON u.id = o.user_id"
    )
    .passed);
}

#[test]
fn test_filter_in_exists_subquery() {
    assert!(users_only(
        "SELECT * FROM orders o WHERE EXISTS \
         (SELECT 1 FROM users u WHERE u.id = o.user_id AND u.deleted = 0)"
    )
    .passed);
}

#[test]
fn test_filter_in_in_subquery() {
    assert!(users_only(
        "SELECT * FROM orders WHERE user_id IN (SELECT id FROM users WHERE deleted = 0)"
    )
    .passed);
}

#[test]
fn test_unfiltered_in_subquery_fails() {
    let result = users_only("SELECT * FROM orders WHERE user_id IN (SELECT id FROM users)");
    assert!(!result.passed);
    assert_eq!(result.violations[0].table_found_at, "level 1");
}

// ── Ambiguity ───────────────────────────────────────────────────────────

#[test]
fn test_unqualified_column_satisfies_every_candidate() {
    let result = validate(
        vec![rule("users", "deleted", 0), rule("posts", "deleted", 0)],
        "SELECT * FROM users u JOIN posts p ON p.user_id = u.id WHERE deleted = 0",
    );
    assert!(result.passed);
    assert_eq!(result.applied_filters["users.deleted"].len(), 1);
    assert_eq!(result.applied_filters["posts.deleted"].len(), 1);
}

#[test]
fn test_explicit_prefixes() {
    let result = validate(
        vec![rule("users", "deleted", 0), rule("posts", "deleted", 0)],
        "SELECT * FROM users u JOIN posts p ON p.user_id = u.id WHERE u.deleted = 0 AND p.deleted = 0",
    );
    assert!(result.passed);
}

#[test]
fn test_filter_on_wrong_table_fails() {
    let result = users_only("SELECT * FROM users u JOIN posts p ON p.user_id = u.id WHERE p.deleted = 0");
    assert!(!result.passed);
}

// ── Complex queries ─────────────────────────────────────────────────────

#[test]
fn test_ctes_joins_and_several_rules() {
    let result = validate(
        vec![
            rule("users", "deleted", 0),
            rule("accounts", "is_test", 0),
            rule("transactions", "reversed", 0),
        ],
        "WITH active_users AS ( \
             SELECT u.* FROM users u JOIN accounts a ON a.id = u.account_id \
             WHERE u.deleted = 0 AND a.is_test = 0 \
         ), valid_transactions AS ( \
             SELECT * FROM transactions WHERE reversed = 0 \
         ) \
         SELECT au.name, COUNT(vt.id) AS transaction_count \
         FROM active_users au LEFT JOIN valid_transactions vt ON vt.user_id = au.id \
         GROUP BY au.name",
    );
    assert!(result.passed, "{:?}", result.violations);
    assert_eq!(
        result.validated_tables,
        tables(&["accounts", "transactions", "users"])
    );
}

#[test]
fn test_union_both_branches_filtered() {
    assert!(users_only(
        "SELECT id, name FROM users WHERE deleted = 0 AND status = 'active' \
         UNION ALL \
         SELECT id, name FROM users WHERE deleted = 0 AND status = 'pending'"
    )
    .passed);
}

#[test]
fn test_union_one_branch_unfiltered() {
    let result = users_only(
        "SELECT id FROM users u WHERE u.deleted = 0 UNION SELECT id FROM users v WHERE v.status = 'x'",
    );
    assert!(!result.passed);
    assert_eq!(result.violations[0].table_found_at, "level 0 as v");
}

#[test]
fn test_having_query() {
    assert!(users_only(
        "SELECT status, COUNT(*) AS user_count FROM users WHERE deleted = 0 \
         GROUP BY status HAVING COUNT(*) > 10"
    )
    .passed);
}

#[test]
fn test_filter_in_having() {
    let result = users_only("SELECT deleted, COUNT(*) FROM users GROUP BY deleted HAVING deleted = 0");
    assert!(result.passed);
    assert_eq!(
        result.applied_filters["users.deleted"][0].location,
        fg_analysis::FilterLocation::Having
    );
}

#[test]
fn test_case_expression() {
    assert!(users_only(
        "SELECT CASE WHEN status = 'active' THEN 'Active User' ELSE 'Inactive User' END AS user_status, \
         COUNT(*) AS count FROM users WHERE deleted = 0 GROUP BY user_status"
    )
    .passed);
}

#[test]
fn test_window_function() {
    assert!(users_only(
        "SELECT name, ROW_NUMBER() OVER (PARTITION BY account_id ORDER BY created_date) AS rn \
         FROM users WHERE deleted = 0"
    )
    .passed);
}

// ── Snowflake syntax ────────────────────────────────────────────────────

#[test]
fn test_qualify() {
    assert!(users_only(
        "SELECT name, ROW_NUMBER() OVER (PARTITION BY account_id ORDER BY created_date) AS rn \
         FROM users WHERE deleted = 0 QUALIFY rn = 1"
    )
    .passed);
}

#[test]
fn test_lateral_flatten() {
    let result = users_only(
        "SELECT u.name, f.value FROM users u, LATERAL FLATTEN(input => u.json_data) f \
         WHERE u.deleted = 0",
    );
    assert!(result.passed);
    assert!(result.parse_error.is_none());
}

#[test]
fn test_join_using() {
    assert!(users_only(
        "SELECT * FROM users u JOIN accounts a USING (account_id) WHERE u.deleted = 0"
    )
    .passed);
}

// ── Edge cases ──────────────────────────────────────────────────────────

#[test]
fn test_empty_query_passes_with_diagnostic() {
    let result = users_only("");
    assert!(result.passed);
    assert!(result.violations.is_empty());
    assert!(result.parse_error.is_some());
}

#[test]
fn test_self_join_both_filtered() {
    assert!(users_only(
        "SELECT * FROM users u1 JOIN users u2 ON u2.manager_id = u1.id \
         WHERE u1.deleted = 0 AND u2.deleted = 0"
    )
    .passed);
}

#[test]
fn test_self_join_one_side_filtered() {
    let result = users_only(
        "SELECT * FROM users u1 JOIN users u2 ON u2.manager_id = u1.id WHERE u1.deleted = 0",
    );
    assert!(!result.passed);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].table_found_at, "level 0 as u2");
    assert_eq!(
        result.violations[0].suggestion,
        "Add 'AND u2.deleted = 0' to the WHERE clause"
    );
}

#[test]
fn test_insert_select_is_checked() {
    assert!(!users_only("INSERT INTO archive SELECT * FROM users").passed);
    assert!(users_only("INSERT INTO archive SELECT * FROM users WHERE deleted = 0").passed);
}

#[test]
fn test_subquery_in_projection_is_checked() {
    let result = users_only(
        "SELECT o.id, (SELECT MAX(u.name) FROM users u WHERE u.id = o.user_id) AS owner FROM orders o",
    );
    assert!(!result.passed);
}

// ── DML statements ──────────────────────────────────────────────────────

#[test]
fn test_delete_without_filter_fails() {
    let result = users_only("DELETE FROM users WHERE id = 5");
    assert!(!result.passed);
    assert!(result.parse_error.is_none());
    assert_eq!(result.validated_tables, tables(&["users"]));
    assert_eq!(result.violations[0].table_found_at, "level 0");
}

#[test]
fn test_delete_with_filter_passes() {
    let result = users_only("DELETE FROM users WHERE id = 5 AND deleted = 0");
    assert!(result.passed);
    assert_eq!(result.validated_tables, tables(&["users"]));
}

#[test]
fn test_delete_using_table_is_checked() {
    let sql = "DELETE FROM orders USING users u WHERE orders.user_id = u.id";
    assert!(!users_only(sql).passed);
    assert!(users_only(&format!("{sql} AND u.deleted = 0")).passed);
}

#[test]
fn test_update_without_filter_fails() {
    let result = users_only("UPDATE users SET status = 'x' WHERE id = 5");
    assert!(!result.passed);
    assert!(result.parse_error.is_none());
    assert_eq!(result.violations.len(), 1);
}

#[test]
fn test_update_with_aliased_filter_passes() {
    let result = users_only("UPDATE users u SET status = 'x' WHERE u.id = 5 AND u.deleted = 0");
    assert!(result.passed);
}

#[test]
fn test_update_from_subquery_is_checked() {
    let result = users_only(
        "UPDATE orders SET owner = (SELECT MAX(name) FROM users) WHERE orders.id = 1",
    );
    assert!(!result.passed);
}

// ── Identifiers and depth ───────────────────────────────────────────────

#[test]
fn test_quoted_uppercase_table_is_the_same_table() {
    let result = users_only("SELECT * FROM \"USERS\"");
    assert!(!result.passed);
    assert_eq!(result.validated_tables, tables(&["users"]));
    assert!(users_only("SELECT * FROM \"USERS\" WHERE \"DELETED\" = 0").passed);
}

#[test]
fn test_deep_nesting_within_max_depth_is_analyzed() {
    let mut sql = "SELECT * FROM users WHERE deleted = 0".to_string();
    for i in 0..40 {
        sql = format!("SELECT * FROM ({sql}) t{i}");
    }
    let result = users_only(&sql);
    assert!(result.parse_error.is_none(), "{:?}", result.parse_error);
    assert!(result.passed);
    assert_eq!(result.validated_tables, tables(&["users"]));
}

// ── Operators ───────────────────────────────────────────────────────────

#[test]
fn test_in_with_single_value() {
    let result = validate(
        vec![rule("users", "status", "active").with_operator(Operator::In)],
        "SELECT * FROM users WHERE status IN ('active')",
    );
    assert!(result.passed);
}

#[test]
fn test_between_does_not_satisfy_equality() {
    assert!(!users_only("SELECT * FROM users WHERE deleted BETWEEN 0 AND 0").passed);
}

#[test]
fn test_is_null_or_equality_passes() {
    assert!(users_only("SELECT * FROM users WHERE deleted IS NULL OR deleted = 0").passed);
}

#[test]
fn test_not_in_does_not_satisfy_in_rule() {
    let result = validate(
        vec![rule("users", "status", "active").with_operator(Operator::In)],
        "SELECT * FROM users WHERE status NOT IN ('active')",
    );
    assert!(!result.passed);
}

// ── Result contents ─────────────────────────────────────────────────────

#[test]
fn test_violation_details() {
    let result = users_only("SELECT * FROM users WHERE status = 'active'");
    let violation = &result.violations[0];
    assert_eq!(violation.rule.table_name, "users");
    assert_eq!(violation.rule.column_name, "deleted");
    assert_eq!(violation.missing_filter, "deleted = 0");
    assert!(violation.suggestion.contains("WHERE"));
}

#[test]
fn test_table_usage_tracking() {
    let result = users_only(
        "WITH u1 AS (SELECT * FROM users), u2 AS (SELECT * FROM users) \
         SELECT * FROM u1 JOIN u2 ON u1.id = u2.manager_id \
         WHERE u1.deleted = 0 AND u2.deleted = 0",
    );
    assert!(result.passed);
    assert_eq!(result.table_usage["users"], vec!["level_1", "level_1"]);
}

#[test]
fn test_applied_filters_tracking() {
    let result = users_only("SELECT * FROM users WHERE deleted = 0 AND status = 'active'");
    assert!(result.passed);
    assert!(result.applied_filters.contains_key("users.deleted"));
    assert_eq!(result.applied_filters["users.deleted"][0].text, "deleted = 0");
}

#[test]
fn test_result_serializes_to_json() {
    let result = users_only("SELECT * FROM users WHERE status = 'active'");
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["passed"], false);
    assert_eq!(json["violations"][0]["missing_filter"], "deleted = 0");
    assert_eq!(json["violations"][0]["rule"]["table"], "users");
    assert_eq!(json["validated_tables"][0], "users");
}
