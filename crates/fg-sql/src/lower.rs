//! Lowering: sqlparser AST → [`SqlTree`]
//!
//! Only the shapes filter analysis reasons about get typed nodes. Everything
//! else becomes an opaque `Expression` node; the subqueries and column
//! references inside it are still lowered as its children so that tables and
//! filters nested in CASE, function arguments or casts are not lost.

use crate::dialect::IdentifierCase;
use crate::error::{SqlError, SqlResult};
use crate::tree::{NodeId, NodeKind, SqlTree};
use fg_core::value::{Operator, Value};
use sqlparser::ast::{
    self, BinaryOperator, Delete, Expr, FromTable, GroupByExpr, Ident, Join, JoinConstraint,
    JoinOperator, ObjectName, Query, Select, SelectItem, SetExpr, Statement, TableFactor,
    TableWithJoins, UnaryOperator, Update, UpdateTableFromKind, Visit, Visitor,
};
use std::fmt::Display;
use std::ops::ControlFlow;

/// Lower parsed statements into one tree, each statement under the root.
///
/// `UPDATE` and `DELETE` are lowered as a query scope over their target
/// tables. Identifiers are spelled as `case` folds them.
///
/// Fails with [`SqlError::UnsupportedStatement`] when no statement contains a
/// query or DML, and with [`SqlError::NestingTooDeep`] when queries or
/// expressions nest deeper than `max_depth`.
pub fn lower_statements(
    statements: &[Statement],
    max_depth: usize,
    case: IdentifierCase,
) -> SqlResult<SqlTree> {
    let mut lowerer = Lowerer {
        tree: SqlTree::with_root(),
        depth: 0,
        max_depth,
        case,
    };
    let root = lowerer.tree.root();
    let mut lowered_queries = 0usize;

    for statement in statements {
        let stmt_id = lowerer.tree.push(root, NodeKind::Statement, None);
        match statement {
            Statement::Update(update) => {
                lowerer.lower_update(stmt_id, update)?;
                lowered_queries += 1;
            }
            Statement::Delete(delete) => {
                lowerer.lower_delete(stmt_id, delete)?;
                lowered_queries += 1;
            }
            other => {
                for found in scan(other, case) {
                    if let Found::Query(query) = found {
                        lowerer.lower_query(stmt_id, &query)?;
                        lowered_queries += 1;
                    }
                }
            }
        }
    }

    if lowered_queries == 0 {
        let kind = statements
            .first()
            .map(statement_kind)
            .unwrap_or_else(|| "empty".to_string());
        return Err(SqlError::UnsupportedStatement(kind));
    }

    log::debug!(
        "Lowered {} statement(s) into {} nodes",
        statements.len(),
        lowerer.tree.len()
    );
    Ok(lowerer.tree)
}

fn statement_kind(statement: &Statement) -> String {
    statement
        .to_string()
        .split_whitespace()
        .next()
        .unwrap_or("unknown")
        .to_uppercase()
}

struct Lowerer {
    tree: SqlTree,
    depth: usize,
    max_depth: usize,
    case: IdentifierCase,
}

impl Lowerer {
    fn enter(&mut self) -> SqlResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(SqlError::NestingTooDeep {
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn ident(&self, ident: &Ident) -> String {
        ident_name(ident, self.case)
    }

    fn lower_update(&mut self, parent: NodeId, update: &Update) -> SqlResult<()> {
        let extra: &[TableWithJoins] = match &update.from {
            Some(UpdateTableFromKind::BeforeSet(tables) | UpdateTableFromKind::AfterSet(tables)) => {
                tables
            }
            None => &[],
        };
        let from: Vec<&TableWithJoins> = std::iter::once(&update.table).chain(extra).collect();
        let values: Vec<&Expr> = update.assignments.iter().map(|a| &a.value).collect();
        self.lower_dml(parent, &values, &from, update.selection.as_ref())
    }

    fn lower_delete(&mut self, parent: NodeId, delete: &Delete) -> SqlResult<()> {
        let (FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables)) =
            &delete.from;
        let from: Vec<&TableWithJoins> = tables
            .iter()
            .chain(delete.using.iter().flatten())
            .collect();
        self.lower_dml(parent, &[], &from, delete.selection.as_ref())
    }

    /// DML as `SELECT values FROM from WHERE selection`, so its target
    /// tables and filters are analyzed exactly like a query's.
    fn lower_dml(
        &mut self,
        parent: NodeId,
        values: &[&Expr],
        from: &[&TableWithJoins],
        selection: Option<&Expr>,
    ) -> SqlResult<()> {
        self.enter()?;
        let query = self.tree.push(parent, NodeKind::Query, None);
        let select = self.tree.push(query, NodeKind::Select, None);

        for value in values {
            let proj = self
                .tree
                .push(select, NodeKind::Projection { alias: None }, None);
            self.lower_expr(proj, value)?;
        }
        for twj in from {
            self.lower_table_with_joins(select, twj)?;
        }
        if let Some(selection) = selection {
            let clause = self.tree.push(select, NodeKind::Where, None);
            self.lower_expr(clause, selection)?;
        }

        self.leave();
        Ok(())
    }

    fn lower_query(&mut self, parent: NodeId, query: &Query) -> SqlResult<NodeId> {
        self.enter()?;
        let id = self.tree.push(parent, NodeKind::Query, None);

        if let Some(with) = &query.with {
            let with_id = self.tree.push(id, NodeKind::With, None);
            for cte in &with.cte_tables {
                let name = self.ident(&cte.alias.name);
                let cte_id = self.tree.push(with_id, NodeKind::Cte { name }, None);
                self.lower_query(cte_id, &cte.query)?;
            }
        }

        self.lower_set_expr(id, &query.body)?;
        self.leave();
        Ok(id)
    }

    fn lower_set_expr(&mut self, parent: NodeId, body: &SetExpr) -> SqlResult<()> {
        match body {
            SetExpr::Select(select) => self.lower_select(parent, select),
            SetExpr::Query(query) => self.lower_query(parent, query).map(|_| ()),
            SetExpr::SetOperation {
                op,
                set_quantifier,
                left,
                right,
            } => {
                let op = format!("{} {}", op, set_quantifier).trim().to_string();
                let id = self.tree.push(parent, NodeKind::SetOperation { op }, None);
                self.lower_set_expr(id, left)?;
                self.lower_set_expr(id, right)
            }
            other => self.lower_opaque(parent, other),
        }
    }

    fn lower_select(&mut self, parent: NodeId, select: &Select) -> SqlResult<()> {
        let id = self.tree.push(parent, NodeKind::Select, None);

        for item in &select.projection {
            let (expr, alias) = match item {
                SelectItem::UnnamedExpr(expr) => (expr, None),
                SelectItem::ExprWithAlias { expr, alias } => (expr, Some(self.ident(alias))),
                // wildcards carry nothing to analyze
                _ => continue,
            };
            let proj = self.tree.push(id, NodeKind::Projection { alias }, None);
            self.lower_expr(proj, expr)?;
        }

        for from in &select.from {
            self.lower_table_with_joins(id, from)?;
        }

        if let Some(selection) = &select.selection {
            let clause = self.tree.push(id, NodeKind::Where, None);
            self.lower_expr(clause, selection)?;
        }

        if let GroupByExpr::Expressions(exprs, _) = &select.group_by {
            if !exprs.is_empty() {
                let clause = self.tree.push(id, NodeKind::GroupBy, None);
                for expr in exprs {
                    self.lower_expr(clause, expr)?;
                }
            }
        }

        if let Some(having) = &select.having {
            let clause = self.tree.push(id, NodeKind::Having, None);
            self.lower_expr(clause, having)?;
        }

        if let Some(qualify) = &select.qualify {
            let clause = self.tree.push(id, NodeKind::Qualify, None);
            self.lower_expr(clause, qualify)?;
        }

        Ok(())
    }

    fn lower_table_with_joins(&mut self, parent: NodeId, twj: &TableWithJoins) -> SqlResult<()> {
        self.lower_table_factor(parent, &twj.relation)?;
        for join in &twj.joins {
            self.lower_join(parent, join)?;
        }
        Ok(())
    }

    fn lower_join(&mut self, parent: NodeId, join: &Join) -> SqlResult<()> {
        let (operator, constraint) = join_parts(&join.join_operator);
        let using = match constraint {
            Some(JoinConstraint::Using(columns)) => columns
                .iter()
                .filter_map(|c| object_name_parts(c, self.case).pop())
                .collect(),
            _ => Vec::new(),
        };

        let id = self.tree.push(
            parent,
            NodeKind::Join {
                operator: operator.to_string(),
                using,
            },
            None,
        );
        self.lower_table_factor(id, &join.relation)?;
        if let Some(JoinConstraint::On(condition)) = constraint {
            self.lower_expr(id, condition)?;
        }
        Ok(())
    }

    fn lower_table_factor(&mut self, parent: NodeId, factor: &TableFactor) -> SqlResult<()> {
        match factor {
            // Table-valued function calls are not table references.
            TableFactor::Table {
                name,
                alias,
                args: None,
                ..
            } => {
                let mut parts = object_name_parts(name, self.case);
                let qualified = parts.join(".");
                let Some(table) = parts.pop() else {
                    return self.lower_opaque(parent, factor);
                };
                let alias = alias.as_ref().map(|a| self.ident(&a.name));
                self.tree.push(
                    parent,
                    NodeKind::Table {
                        name: table,
                        qualified,
                        alias,
                    },
                    None,
                );
                Ok(())
            }
            TableFactor::Derived {
                subquery, alias, ..
            } => {
                let alias = alias.as_ref().map(|a| self.ident(&a.name));
                let id = self.tree.push(parent, NodeKind::Derived { alias }, None);
                self.lower_query(id, subquery).map(|_| ())
            }
            TableFactor::NestedJoin {
                table_with_joins,
                alias,
            } => {
                let alias = alias.as_ref().map(|a| self.ident(&a.name));
                let id = self.tree.push(parent, NodeKind::NestedJoin { alias }, None);
                self.lower_table_with_joins(id, table_with_joins)
            }
            other => self.lower_opaque(parent, other),
        }
    }

    fn lower_expr(&mut self, parent: NodeId, expr: &Expr) -> SqlResult<()> {
        self.enter()?;
        self.lower_expr_inner(parent, expr)?;
        self.leave();
        Ok(())
    }

    fn lower_expr_inner(&mut self, parent: NodeId, expr: &Expr) -> SqlResult<()> {
        let text = Some(expr.to_string());

        if let Some(value) = literal_of(expr) {
            self.tree.push(parent, NodeKind::Literal { value }, text);
            return Ok(());
        }

        match expr {
            Expr::Nested(inner) => self.lower_expr(parent, inner),

            Expr::Identifier(_) | Expr::CompoundIdentifier(_) => {
                if let Some((table, name)) = column_parts(expr, self.case) {
                    self.tree
                        .push(parent, NodeKind::Column { table, name }, text);
                }
                Ok(())
            }

            Expr::BinaryOp { left, op, right } => {
                let kind = match op {
                    BinaryOperator::And => NodeKind::And,
                    BinaryOperator::Or => NodeKind::Or,
                    op => match comparison_operator(op) {
                        Some(op) => NodeKind::Compare { op },
                        None => return self.lower_opaque(parent, expr),
                    },
                };
                let id = self.tree.push(parent, kind, text);
                self.lower_expr(id, left)?;
                self.lower_expr(id, right)
            }

            Expr::UnaryOp {
                op: UnaryOperator::Not,
                expr: inner,
            } => {
                let id = self.tree.push(parent, NodeKind::Not, text);
                self.lower_expr(id, inner)
            }

            Expr::InList {
                expr: tested,
                list,
                negated,
            } => {
                let id = self
                    .tree
                    .push(parent, NodeKind::In { negated: *negated }, text);
                self.lower_expr(id, tested)?;
                for item in list {
                    self.lower_expr(id, item)?;
                }
                Ok(())
            }

            Expr::InSubquery {
                expr: tested,
                subquery,
                negated,
            } => {
                let id = self
                    .tree
                    .push(parent, NodeKind::InSubquery { negated: *negated }, text);
                self.lower_expr(id, tested)?;
                let sub = self.tree.push(id, NodeKind::Subquery, None);
                self.lower_query(sub, subquery).map(|_| ())
            }

            Expr::Exists { subquery, negated } => {
                let id = self
                    .tree
                    .push(parent, NodeKind::Exists { negated: *negated }, text);
                let sub = self.tree.push(id, NodeKind::Subquery, None);
                self.lower_query(sub, subquery).map(|_| ())
            }

            Expr::Subquery(query) => {
                let sub = self.tree.push(parent, NodeKind::Subquery, text);
                self.lower_query(sub, query).map(|_| ())
            }

            other => self.lower_opaque(parent, other),
        }
    }

    /// Push an `Expression` node for `node`, then lower the top-level
    /// subqueries and column references found inside it.
    fn lower_opaque<T: Visit + Display>(&mut self, parent: NodeId, node: &T) -> SqlResult<()> {
        let id = self
            .tree
            .push(parent, NodeKind::Expression, Some(node.to_string()));
        for found in scan(node, self.case) {
            match found {
                Found::Query(query) => {
                    let sub = self.tree.push(id, NodeKind::Subquery, None);
                    self.lower_query(sub, &query)?;
                }
                Found::Column { table, name, text } => {
                    self.tree
                        .push(id, NodeKind::Column { table, name }, Some(text));
                }
            }
        }
        Ok(())
    }
}

enum Found {
    Query(Box<Query>),
    Column {
        table: Option<String>,
        name: String,
        text: String,
    },
}

/// Collects queries and column references that are not nested inside
/// another query, in visit order.
struct TopLevelScan {
    case: IdentifierCase,
    depth: usize,
    found: Vec<Found>,
}

impl Visitor for TopLevelScan {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        if self.depth == 0 {
            self.found.push(Found::Query(Box::new(query.clone())));
        }
        self.depth += 1;
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, _query: &Query) -> ControlFlow<Self::Break> {
        self.depth = self.depth.saturating_sub(1);
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        if self.depth == 0 {
            if let Some((table, name)) = column_parts(expr, self.case) {
                self.found.push(Found::Column {
                    table,
                    name,
                    text: expr.to_string(),
                });
            }
        }
        ControlFlow::Continue(())
    }
}

fn scan<T: Visit>(node: &T, case: IdentifierCase) -> Vec<Found> {
    let mut visitor = TopLevelScan {
        case,
        depth: 0,
        found: Vec::new(),
    };
    let _ = node.visit(&mut visitor);
    visitor.found
}

fn ident_name(ident: &Ident, case: IdentifierCase) -> String {
    case.canonical(&ident.value, ident.quote_style.is_some())
}

fn object_name_parts(name: &ObjectName, case: IdentifierCase) -> Vec<String> {
    name.0
        .iter()
        .filter_map(|part| part.as_ident())
        .map(|ident| ident_name(ident, case))
        .collect()
}

/// `(qualifier, column)` for identifier expressions. For `db.schema.t.c` the
/// qualifier is `t`.
fn column_parts(expr: &Expr, case: IdentifierCase) -> Option<(Option<String>, String)> {
    match expr {
        Expr::Identifier(ident) => Some((None, ident_name(ident, case))),
        Expr::CompoundIdentifier(idents) => {
            let (last, rest) = idents.split_last()?;
            Some((
                rest.last().map(|q| ident_name(q, case)),
                ident_name(last, case),
            ))
        }
        _ => None,
    }
}

fn comparison_operator(op: &BinaryOperator) -> Option<Operator> {
    match op {
        BinaryOperator::Eq => Some(Operator::Eq),
        BinaryOperator::NotEq => Some(Operator::NotEq),
        BinaryOperator::Lt => Some(Operator::Lt),
        BinaryOperator::Gt => Some(Operator::Gt),
        BinaryOperator::LtEq => Some(Operator::LtEq),
        BinaryOperator::GtEq => Some(Operator::GtEq),
        _ => None,
    }
}

/// Literal value of `expr`, folding a sign applied to a numeric literal.
fn literal_of(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Value(v) => literal_value(&v.value),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr: inner,
        } => match literal_of(inner)? {
            Value::Integer(i) => i.checked_neg().map(Value::Integer),
            Value::Float(f) => Some(Value::Float(-f)),
            _ => None,
        },
        Expr::UnaryOp {
            op: UnaryOperator::Plus,
            expr: inner,
        } => literal_of(inner).filter(|v| v.as_f64().is_some()),
        _ => None,
    }
}

fn literal_value(value: &ast::Value) -> Option<Value> {
    match value {
        ast::Value::Number(n, _) => n
            .parse::<i64>()
            .map(Value::Integer)
            .or_else(|_| n.parse::<f64>().map(Value::Float))
            .ok(),
        ast::Value::SingleQuotedString(s)
        | ast::Value::DoubleQuotedString(s)
        | ast::Value::EscapedStringLiteral(s)
        | ast::Value::NationalStringLiteral(s) => Some(Value::String(s.clone())),
        ast::Value::Boolean(b) => Some(Value::Boolean(*b)),
        _ => None,
    }
}

fn join_parts(operator: &JoinOperator) -> (&'static str, Option<&JoinConstraint>) {
    match operator {
        JoinOperator::Join(c) => ("JOIN", Some(c)),
        JoinOperator::Inner(c) => ("INNER", Some(c)),
        JoinOperator::Left(c) | JoinOperator::LeftOuter(c) => ("LEFT", Some(c)),
        JoinOperator::Right(c) | JoinOperator::RightOuter(c) => ("RIGHT", Some(c)),
        JoinOperator::FullOuter(c) => ("FULL", Some(c)),
        JoinOperator::LeftSemi(c) => ("LEFT SEMI", Some(c)),
        JoinOperator::RightSemi(c) => ("RIGHT SEMI", Some(c)),
        JoinOperator::LeftAnti(c) => ("LEFT ANTI", Some(c)),
        JoinOperator::RightAnti(c) => ("RIGHT ANTI", Some(c)),
        JoinOperator::CrossJoin(_) => ("CROSS", None),
        _ => ("OTHER", None),
    }
}

#[cfg(test)]
#[path = "lower_test.rs"]
mod tests;
