use super::*;
use crate::test_utils::parse;

#[test]
fn test_collects_definitions_in_order() {
    let tree = parse(
        "WITH a AS (SELECT * FROM users), b AS (SELECT * FROM orders) \
         SELECT * FROM a JOIN b ON a.id = b.user_id",
    );
    let registry = CteRegistry::collect(&tree);
    let names: Vec<_> = registry.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(registry.contains("a"));
    assert!(!registry.contains("users"));
    assert_eq!(tree.tag(registry.get("b").unwrap().body), NodeTag::Query);
}

#[test]
fn test_duplicate_name_keeps_last_definition() {
    let tree = parse(
        "WITH a AS (SELECT * FROM users) \
         SELECT * FROM (WITH a AS (SELECT * FROM orders) SELECT * FROM a) x",
    );
    let registry = CteRegistry::collect(&tree);
    assert_eq!(registry.len(), 1);
    assert_eq!(
        registry.first_physical_table(&tree, "a", CteResolution::SingleHop),
        Some("orders".to_string())
    );
}

#[test]
fn test_single_hop_skips_cte_names() {
    let tree = parse(
        "WITH base AS (SELECT * FROM users), \
              filtered AS (SELECT * FROM base JOIN accounts ON base.account_id = accounts.id) \
         SELECT * FROM filtered",
    );
    let registry = CteRegistry::collect(&tree);
    assert_eq!(
        registry.first_physical_table(&tree, "filtered", CteResolution::SingleHop),
        Some("accounts".to_string())
    );
}

#[test]
fn test_single_hop_chain_resolves_to_nothing() {
    let tree = parse(
        "WITH base AS (SELECT * FROM users), filtered AS (SELECT * FROM base) \
         SELECT * FROM filtered",
    );
    let registry = CteRegistry::collect(&tree);
    assert_eq!(
        registry.first_physical_table(&tree, "filtered", CteResolution::SingleHop),
        None
    );
    assert_eq!(
        registry.first_physical_table(&tree, "base", CteResolution::SingleHop),
        Some("users".to_string())
    );
}

#[test]
fn test_transitive_follows_chain() {
    let tree = parse(
        "WITH a AS (SELECT * FROM users), b AS (SELECT * FROM a), c AS (SELECT * FROM b) \
         SELECT * FROM c",
    );
    let registry = CteRegistry::collect(&tree);
    assert_eq!(
        registry.first_physical_table(&tree, "c", CteResolution::Transitive),
        Some("users".to_string())
    );
}

#[test]
fn test_transitive_stops_on_cycle() {
    let tree = parse(
        "WITH RECURSIVE r AS (SELECT 1 AS n UNION ALL SELECT n + 1 FROM r WHERE n < 5) \
         SELECT * FROM r",
    );
    let registry = CteRegistry::collect(&tree);
    assert_eq!(
        registry.first_physical_table(&tree, "r", CteResolution::Transitive),
        None
    );
}

#[test]
fn test_unknown_name() {
    let tree = parse("SELECT * FROM users");
    let registry = CteRegistry::collect(&tree);
    assert!(registry.is_empty());
    assert_eq!(
        registry.first_physical_table(&tree, "users", CteResolution::SingleHop),
        None
    );
}
