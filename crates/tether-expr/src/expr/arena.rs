//! Append-only expression arena.
//!
//! Nodes are never mutated after they are pushed. Replacing part of a model
//! expression means pushing new nodes and re-pointing the owner at the new
//! root, so "did this expression change" reduces to comparing [`ExprId`]s.

use crate::ids::{ExprId, NamedExprId, ParamId, VariableId};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Constant(f64),
    Var(VariableId),
    Param(ParamId),
    /// Flat linear form: constant + sum(coeff * var).
    Linear {
        constant: f64,
        terms: Vec<(VariableId, f64)>,
    },
    Sum(Vec<ExprId>),
    /// Binary product, stored as a pair so children can be borrowed as a slice.
    Product([ExprId; 2]),
    Negation(ExprId),
    /// Reference to a shared named expression. The inner expression is
    /// looked up on the owner at traversal time.
    Named(NamedExprId),
    /// Call into a user-supplied external function.
    External { function: String, args: Vec<ExprId> },
}

impl Node {
    /// Child handles in evaluation order.
    pub fn children(&self) -> &[ExprId] {
        match self {
            Node::Sum(args) | Node::External { args, .. } => args,
            Node::Product(pair) => pair,
            Node::Negation(arg) => std::slice::from_ref(arg),
            Node::Constant(_)
            | Node::Var(_)
            | Node::Param(_)
            | Node::Linear { .. }
            | Node::Named(_) => &[],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExprArena {
    nodes: Vec<Node>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Push a node and return its identity.
    pub fn push(&mut self, node: Node) -> ExprId {
        let id = ExprId::new(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: ExprId) -> Option<&Node> {
        self.nodes.get(id.inner() as usize)
    }

    // ── Convenience constructors ────────────────────────────

    pub fn constant(&mut self, value: f64) -> ExprId {
        self.push(Node::Constant(value))
    }

    pub fn var(&mut self, var_id: VariableId) -> ExprId {
        self.push(Node::Var(var_id))
    }

    pub fn param(&mut self, param_id: ParamId) -> ExprId {
        self.push(Node::Param(param_id))
    }

    pub fn linear(&mut self, terms: Vec<(VariableId, f64)>, constant: f64) -> ExprId {
        self.push(Node::Linear { constant, terms })
    }

    pub fn sum(&mut self, args: Vec<ExprId>) -> ExprId {
        self.push(Node::Sum(args))
    }

    pub fn product(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.push(Node::Product([lhs, rhs]))
    }

    pub fn negation(&mut self, arg: ExprId) -> ExprId {
        self.push(Node::Negation(arg))
    }

    pub fn named(&mut self, named_id: NamedExprId) -> ExprId {
        self.push(Node::Named(named_id))
    }

    pub fn external(&mut self, function: impl Into<String>, args: Vec<ExprId>) -> ExprId {
        self.push(Node::External {
            function: function.into(),
            args,
        })
    }
}
