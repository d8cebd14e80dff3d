//! Filter extraction from WHERE, JOIN ON and HAVING clauses.
//!
//! AND and OR operands are both descended, so a condition under an OR counts
//! as found. `NOT`, `NOT IN`, `IN (subquery)`, `EXISTS`, `BETWEEN`,
//! `IS NULL` and `LIKE` contribute nothing; filters inside their subqueries
//! are picked up from the subquery's own clauses.

use crate::analysis::{scope_level, VisitSet};
use crate::types::{FilterCondition, FilterLocation};
use fg_core::value::{Operator, Value};
use fg_sql::{NodeId, NodeKind, NodeTag, SqlTree};

/// Extract every `column op value` and `column IN (...)` condition.
///
/// Roots are visited in clause order: all WHERE clauses, then all join
/// conditions, then all HAVING clauses.
pub fn extract_filters(tree: &SqlTree, seen: &mut VisitSet) -> Vec<FilterCondition> {
    let mut extractor = Extractor {
        tree,
        seen,
        out: Vec::new(),
    };

    let wheres: Vec<_> = tree
        .find_all(NodeTag::Where)
        .filter_map(|id| tree.clause_expr(id))
        .collect();
    for expr in wheres {
        extractor.walk(expr, FilterLocation::Where);
    }

    let joins: Vec<_> = tree
        .find_all(NodeTag::Join)
        .filter_map(|id| tree.join_condition(id))
        .collect();
    for expr in joins {
        extractor.walk(expr, FilterLocation::Join);
    }

    let havings: Vec<_> = tree
        .find_all(NodeTag::Having)
        .filter_map(|id| tree.clause_expr(id))
        .collect();
    for expr in havings {
        extractor.walk(expr, FilterLocation::Having);
    }

    extractor.out
}

struct Extractor<'a> {
    tree: &'a SqlTree,
    seen: &'a mut VisitSet,
    out: Vec<FilterCondition>,
}

impl Extractor<'_> {
    fn walk(&mut self, id: NodeId, location: FilterLocation) {
        if !self.seen.first_visit(id) {
            return;
        }
        match self.tree.kind(id) {
            NodeKind::And | NodeKind::Or => {
                if let Some((left, right)) = self.tree.operands(id) {
                    self.walk(left, location);
                    self.walk(right, location);
                }
            }
            NodeKind::Compare { op } => self.comparison(id, *op, location),
            NodeKind::In { negated: false } => self.membership(id, location),
            _ => {}
        }
    }

    fn comparison(&mut self, id: NodeId, op: Operator, location: FilterLocation) {
        let Some((left, right)) = self.tree.operands(id) else {
            return;
        };
        let (column, other, op) = match (self.column(left), self.column(right)) {
            (Some(column), None) => (column, right, op),
            (None, Some(column)) => (column, left, op.mirrored()),
            // column = column, literal = literal
            _ => return,
        };
        let value = self.value(other);
        self.emit(id, column, op, value, location);
    }

    fn membership(&mut self, id: NodeId, location: FilterLocation) {
        let Some((&tested, items)) = self.tree.children(id).split_first() else {
            return;
        };
        let Some(column) = self.column(tested) else {
            return;
        };
        let values = items.iter().map(|&item| self.value(item)).collect();
        self.emit(id, column, Operator::In, Value::List(values), location);
    }

    fn emit(
        &mut self,
        id: NodeId,
        (table_ref, column_name): (Option<String>, String),
        operator: Operator,
        value: Value,
        location: FilterLocation,
    ) {
        self.out.push(FilterCondition {
            table_ref,
            column_name,
            operator,
            value,
            location,
            scope_level: scope_level(self.tree, id),
            source_node: id,
            text: self.tree.text(id).unwrap_or_default().to_string(),
        });
    }

    fn column(&self, id: NodeId) -> Option<(Option<String>, String)> {
        match self.tree.kind(id) {
            NodeKind::Column { table, name } => Some((table.clone(), name.clone())),
            _ => None,
        }
    }

    /// Literal value of a node, or its SQL text as an opaque expression.
    fn value(&self, id: NodeId) -> Value {
        match self.tree.kind(id) {
            NodeKind::Literal { value } => value.clone(),
            _ => Value::Expression(self.tree.text(id).unwrap_or_default().to_string()),
        }
    }
}

#[cfg(test)]
#[path = "filters_test.rs"]
mod tests;
