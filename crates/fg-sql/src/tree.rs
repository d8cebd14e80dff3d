//! Arena-backed expression tree lowered from the sqlparser AST.
//!
//! Nodes are allocated parent-first while lowering walks the statement in
//! source order, so arena order is document (pre-)order. Children follow
//! positional conventions per kind:
//!
//! | kind | children |
//! |------|----------|
//! | `Root` | `Statement*` |
//! | `Statement` | `Query*` (top-level queries of the statement) |
//! | `Query` | `With?`, then one body (`Select`, `SetOperation` or `Query`) |
//! | `With` | `Cte*` |
//! | `Cte`, `Derived`, `Subquery` | `Query` |
//! | `Select` | `Projection*`, from items, `Where?`, `GroupBy?`, `Having?`, `Qualify?` |
//! | `SetOperation` | left body, right body |
//! | `NestedJoin` | relation, `Join*` |
//! | `Join` | relation, then the ON expression if any |
//! | `Where`, `Having`, `Qualify`, `Projection`, `Not` | one expression |
//! | `And`, `Or`, `Compare` | left, right |
//! | `In` | tested expression, then list items |
//! | `InSubquery` | tested expression, `Subquery` |
//! | `Exists` | `Subquery` |
//! | `Expression` | subqueries and columns found inside the opaque expression |

use fg_core::value::{Operator, Value};
use serde::Serialize;
use std::collections::HashSet;

/// Identity of a node: its index in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Node kind with its typed attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Statement,
    Query,
    With,
    Cte {
        name: String,
    },
    Select,
    SetOperation {
        op: String,
    },
    Projection {
        alias: Option<String>,
    },
    /// A named relation in FROM. `name` is the last part of the object name,
    /// `qualified` the full dotted name.
    Table {
        name: String,
        qualified: String,
        alias: Option<String>,
    },
    Derived {
        alias: Option<String>,
    },
    NestedJoin {
        alias: Option<String>,
    },
    Join {
        operator: String,
        using: Vec<String>,
    },
    Where,
    GroupBy,
    Having,
    Qualify,
    And,
    Or,
    Not,
    Compare {
        op: Operator,
    },
    In {
        negated: bool,
    },
    InSubquery {
        negated: bool,
    },
    Exists {
        negated: bool,
    },
    Subquery,
    Column {
        table: Option<String>,
        name: String,
    },
    Literal {
        value: Value,
    },
    /// Any expression the analysis does not look inside
    Expression,
}

/// Fieldless mirror of [`NodeKind`] used for lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTag {
    Root,
    Statement,
    Query,
    With,
    Cte,
    Select,
    SetOperation,
    Projection,
    Table,
    Derived,
    NestedJoin,
    Join,
    Where,
    GroupBy,
    Having,
    Qualify,
    And,
    Or,
    Not,
    Compare,
    In,
    InSubquery,
    Exists,
    Subquery,
    Column,
    Literal,
    Expression,
}

impl NodeKind {
    pub fn tag(&self) -> NodeTag {
        match self {
            NodeKind::Root => NodeTag::Root,
            NodeKind::Statement => NodeTag::Statement,
            NodeKind::Query => NodeTag::Query,
            NodeKind::With => NodeTag::With,
            NodeKind::Cte { .. } => NodeTag::Cte,
            NodeKind::Select => NodeTag::Select,
            NodeKind::SetOperation { .. } => NodeTag::SetOperation,
            NodeKind::Projection { .. } => NodeTag::Projection,
            NodeKind::Table { .. } => NodeTag::Table,
            NodeKind::Derived { .. } => NodeTag::Derived,
            NodeKind::NestedJoin { .. } => NodeTag::NestedJoin,
            NodeKind::Join { .. } => NodeTag::Join,
            NodeKind::Where => NodeTag::Where,
            NodeKind::GroupBy => NodeTag::GroupBy,
            NodeKind::Having => NodeTag::Having,
            NodeKind::Qualify => NodeTag::Qualify,
            NodeKind::And => NodeTag::And,
            NodeKind::Or => NodeTag::Or,
            NodeKind::Not => NodeTag::Not,
            NodeKind::Compare { .. } => NodeTag::Compare,
            NodeKind::In { .. } => NodeTag::In,
            NodeKind::InSubquery { .. } => NodeTag::InSubquery,
            NodeKind::Exists { .. } => NodeTag::Exists,
            NodeKind::Subquery => NodeTag::Subquery,
            NodeKind::Column { .. } => NodeTag::Column,
            NodeKind::Literal { .. } => NodeTag::Literal,
            NodeKind::Expression => NodeTag::Expression,
        }
    }
}

/// One arena slot.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// SQL rendering, kept for expression nodes
    pub text: Option<String>,
}

/// Immutable tree of lowered SQL. Built once per query by
/// [`lower_statements`](crate::lower_statements).
#[derive(Debug, Clone)]
pub struct SqlTree {
    nodes: Vec<Node>,
}

impl SqlTree {
    pub(crate) fn with_root() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
                text: None,
            }],
        }
    }

    /// Append a node under `parent`. Callers allocate parents before
    /// children to keep arena order equal to document order.
    pub(crate) fn push(&mut self, parent: NodeId, kind: NodeKind, text: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            text,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn tag(&self, id: NodeId) -> NodeTag {
        self.nodes[id.0].kind.tag()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].text.as_deref()
    }

    /// Every node of the given kind, in document order.
    ///
    /// The iterator is lazy and borrows the tree, so calling `find_all` again
    /// starts a fresh traversal.
    pub fn find_all(&self, tag: NodeTag) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.kind.tag() == tag)
            .map(|(i, _)| NodeId(i))
    }

    /// Depth-first pre-order walk of the nodes below `id`, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { tree: self, stack }
    }

    /// Parent chain of `id`, nearest first, excluding `id`.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Nearest ancestor of `id` with the given kind.
    pub fn nearest_ancestor(&self, id: NodeId, tag: NodeTag) -> Option<NodeId> {
        self.ancestors(id).find(|&a| self.tag(a) == tag)
    }

    /// Left and right operands of `And`, `Or` and `Compare` nodes.
    pub fn operands(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        match (self.kind(id), self.children(id)) {
            (NodeKind::And | NodeKind::Or | NodeKind::Compare { .. }, [left, right]) => {
                Some((*left, *right))
            }
            _ => None,
        }
    }

    /// The single expression of a `Where`, `Having`, `Qualify`, `Projection`
    /// or `Not` node.
    pub fn clause_expr(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::Where
            | NodeKind::Having
            | NodeKind::Qualify
            | NodeKind::Projection { .. }
            | NodeKind::Not => self.children(id).first().copied(),
            _ => None,
        }
    }

    /// The ON expression of a `Join` node.
    pub fn join_condition(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::Join { .. } => self.children(id).get(1).copied(),
            _ => None,
        }
    }

    /// The `Query` under a `Cte`, `Derived` or `Subquery` node.
    pub fn body(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::Cte { .. } | NodeKind::Derived { .. } | NodeKind::Subquery => self
                .children(id)
                .first()
                .copied()
                .filter(|&c| self.tag(c) == NodeTag::Query),
            _ => None,
        }
    }

    /// Name of a `Table` node, if `id` is one.
    pub fn table_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Table { name, .. } => Some(name),
            _ => None,
        }
    }

    /// First `Table` node below `id`, in pre-order, whose name is not in
    /// `excluded`.
    pub fn first_table_excluding(&self, id: NodeId, excluded: &HashSet<String>) -> Option<NodeId> {
        self.descendants(id).find(|&d| {
            self.table_name(d)
                .is_some_and(|name| !excluded.contains(name))
        })
    }
}

/// Iterator returned by [`SqlTree::descendants`].
pub struct Descendants<'a> {
    tree: &'a SqlTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Iterator returned by [`SqlTree::ancestors`].
pub struct Ancestors<'a> {
    tree: &'a SqlTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.parent(id);
        Some(id)
    }
}

#[cfg(test)]
#[path = "tree_test.rs"]
mod tests;
