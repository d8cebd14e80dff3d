use super::*;
use crate::test_utils::parse;

fn extract(sql: &str) -> Vec<FilterCondition> {
    let tree = parse(sql);
    extract_filters(&tree, &mut VisitSet::new())
}

fn triples(conditions: &[FilterCondition]) -> Vec<(String, Operator, Value)> {
    conditions
        .iter()
        .map(|c| (c.column_display(), c.operator, c.value.clone()))
        .collect()
}

#[test]
fn test_and_or_both_descended() {
    let found = extract("SELECT * FROM users u WHERE u.deleted = 0 AND (status = 'a' OR age > 18)");
    assert_eq!(
        triples(&found),
        vec![
            ("u.deleted".to_string(), Operator::Eq, Value::Integer(0)),
            ("status".to_string(), Operator::Eq, Value::from("a")),
            ("age".to_string(), Operator::Gt, Value::Integer(18)),
        ]
    );
    assert!(found.iter().all(|c| c.location == FilterLocation::Where));
    assert_eq!(found[0].text, "u.deleted = 0");
}

#[test]
fn test_column_on_right_mirrors_operator() {
    let found = extract("SELECT * FROM users WHERE 18 < age AND 0 = deleted");
    assert_eq!(
        triples(&found),
        vec![
            ("age".to_string(), Operator::Gt, Value::Integer(18)),
            ("deleted".to_string(), Operator::Eq, Value::Integer(0)),
        ]
    );
}

#[test]
fn test_column_to_column_and_literal_to_literal_skipped() {
    let found = extract("SELECT * FROM a JOIN b ON a.id = b.a_id WHERE 1 = 1");
    assert!(found.is_empty());
}

#[test]
fn test_opaque_right_side_is_expression() {
    let found = extract("SELECT * FROM events WHERE created_at >= TO_DATE('2024-01-01')");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].operator, Operator::GtEq);
    assert_eq!(
        found[0].value,
        Value::Expression("TO_DATE('2024-01-01')".to_string())
    );
}

#[test]
fn test_negative_literal() {
    let found = extract("SELECT * FROM accounts WHERE balance > -100");
    assert_eq!(found[0].value, Value::Integer(-100));
}

#[test]
fn test_in_list_values_in_order() {
    let found = extract("SELECT * FROM users WHERE status IN ('a', 'b', LOWER('C'))");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].operator, Operator::In);
    assert_eq!(
        found[0].value,
        Value::List(vec![
            Value::from("a"),
            Value::from("b"),
            Value::Expression("LOWER('C')".to_string()),
        ])
    );
}

#[test]
fn test_negations_and_other_predicates_yield_nothing() {
    let found = extract(
        "SELECT * FROM users WHERE NOT deleted = 0 \
         AND status NOT IN ('x') \
         AND deleted BETWEEN 0 AND 0 \
         AND email IS NULL \
         AND name LIKE 'a%' \
         AND id IN (SELECT user_id FROM bans)",
    );
    assert!(found.is_empty());
}

#[test]
fn test_clause_order_where_join_having() {
    let found = extract(
        "SELECT status, COUNT(*) FROM users u JOIN accounts a ON a.id = u.account_id AND a.is_test = 0 \
         WHERE u.deleted = 0 GROUP BY status HAVING MAX(u.age) > 1 AND status = 'x'",
    );
    let locations: Vec<_> = found.iter().map(|c| (c.column_display(), c.location)).collect();
    assert_eq!(
        locations,
        vec![
            ("u.deleted".to_string(), FilterLocation::Where),
            ("a.is_test".to_string(), FilterLocation::Join),
            ("status".to_string(), FilterLocation::Having),
        ]
    );
}

#[test]
fn test_subquery_conditions_carry_scope_level() {
    let found = extract(
        "SELECT * FROM orders WHERE user_id IN (SELECT id FROM users WHERE deleted = 0) AND total > 5",
    );
    let levels: Vec<_> = found.iter().map(|c| (c.column_name.as_str(), c.scope_level)).collect();
    assert_eq!(levels, vec![("total", 0), ("deleted", 1)]);
}
