//! Table schemas for the column existence check.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Declared columns of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<String>,
}

/// Case-insensitive lookup of table schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    tables: HashMap<String, HashSet<String>>,
}

impl SchemaCatalog {
    /// Build a catalog, rejecting a table declared twice.
    pub fn from_schemas(schemas: &[TableSchema]) -> CoreResult<Self> {
        let mut tables = HashMap::with_capacity(schemas.len());
        for schema in schemas {
            let key = schema.table.to_lowercase();
            let columns = schema.columns.iter().map(|c| c.to_lowercase()).collect();
            if tables.insert(key, columns).is_some() {
                return Err(CoreError::DuplicateSchemaTable {
                    table: schema.table.clone(),
                });
            }
        }
        Ok(Self { tables })
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(&table.to_lowercase())
    }

    /// `None` when the table itself is unknown.
    pub fn has_column(&self, table: &str, column: &str) -> Option<bool> {
        self.tables
            .get(&table.to_lowercase())
            .map(|cols| cols.contains(&column.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableSchema {
        TableSchema {
            table: "Users".to_string(),
            columns: vec!["id".to_string(), "Deleted".to_string()],
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = SchemaCatalog::from_schemas(&[users()]).unwrap();
        assert!(catalog.has_table("users"));
        assert_eq!(catalog.has_column("USERS", "deleted"), Some(true));
        assert_eq!(catalog.has_column("users", "email"), Some(false));
        assert_eq!(catalog.has_column("orders", "id"), None);
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let err = SchemaCatalog::from_schemas(&[users(), users()]).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateSchemaTable { .. }));
    }
}
