//! Single-pass classification of the leaves of an expression tree.
//!
//! The walker answers "which variables, fixed variables, parameters, named
//! expressions and external calls does this expression touch" without
//! evaluating it.
//! Traversal is iterative so arbitrarily deep trees do not grow the call
//! stack, and all scratch state lives in the call so the walker is
//! reentrant.

use std::collections::HashSet;

use crate::expr::{ExprError, Node};
use crate::ids::{ExprId, NamedExprId, ParamId, VariableId};

/// Read access to expression nodes and the variable state the walker needs.
pub trait ExprSource {
    /// Node behind a handle, `None` for a dangling handle.
    fn node(&self, id: ExprId) -> Option<&Node>;

    /// Current inner expression of a named expression.
    fn named_expr(&self, id: NamedExprId) -> Option<ExprId>;

    /// Whether the variable is currently fixed.
    fn is_fixed(&self, var_id: VariableId) -> bool;

    /// Value of a numeric-constant leaf, `None` for anything else.
    fn numeric_constant(&self, id: ExprId) -> Option<f64> {
        match self.node(id) {
            Some(Node::Constant(value)) => Some(*value),
            _ => None,
        }
    }
}

/// Leaves collected from one expression, each list free of duplicates and
/// in first-visit order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collected {
    pub named_exprs: Vec<NamedExprId>,
    pub variables: Vec<VariableId>,
    pub fixed_variables: Vec<VariableId>,
    pub params: Vec<ParamId>,
    /// Handles of the external-function call nodes.
    pub external_functions: Vec<ExprId>,
}

#[derive(Default)]
struct Seen {
    named: HashSet<NamedExprId>,
    variables: HashSet<VariableId>,
    params: HashSet<ParamId>,
    external: HashSet<ExprId>,
}

impl Seen {
    fn variable<S: ExprSource + ?Sized>(
        &mut self,
        source: &S,
        out: &mut Collected,
        var_id: VariableId,
    ) {
        if self.variables.insert(var_id) {
            out.variables.push(var_id);
            if source.is_fixed(var_id) {
                out.fixed_variables.push(var_id);
            }
        }
    }
}

/// Walk `root` post-order and classify its leaves.
///
/// A named expression is recorded and its current inner expression is
/// traversed the first time it is met, so variables reached only through a
/// named expression still count as referenced. Arguments of external calls
/// are traversed as well.
pub fn collect_vars_and_named_exprs<S: ExprSource + ?Sized>(
    source: &S,
    root: ExprId,
) -> Result<Collected, ExprError> {
    let mut out = Collected::default();
    let mut seen = Seen::default();
    // (node, index of the next child to visit)
    let mut stack: Vec<(ExprId, usize)> = vec![(root, 0)];

    while let Some(&(id, next_child)) = stack.last() {
        let node = source.node(id).ok_or(ExprError::UnknownNode(id))?;

        let child = match node {
            Node::Var(var_id) => {
                seen.variable(source, &mut out, *var_id);
                None
            }
            Node::Linear { terms, .. } => {
                for (var_id, _) in terms {
                    seen.variable(source, &mut out, *var_id);
                }
                None
            }
            Node::Param(param_id) => {
                if seen.params.insert(*param_id) {
                    out.params.push(*param_id);
                }
                None
            }
            Node::Named(named_id) => {
                if next_child == 0 && seen.named.insert(*named_id) {
                    out.named_exprs.push(*named_id);
                    Some(
                        source
                            .named_expr(*named_id)
                            .ok_or(ExprError::UnknownNamedExpr(*named_id))?,
                    )
                } else {
                    None
                }
            }
            Node::External { args, .. } => {
                if next_child == 0 && seen.external.insert(id) {
                    out.external_functions.push(id);
                }
                args.get(next_child).copied()
            }
            other => other.children().get(next_child).copied(),
        };

        match child {
            Some(child) => {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                stack.push((child, 0));
            }
            None => {
                stack.pop();
            }
        }
    }

    tracing::trace!(
        component = "expr",
        operation = "collect",
        status = "success",
        root = root.inner(),
        variables = out.variables.len(),
        fixed_variables = out.fixed_variables.len(),
        params = out.params.len(),
        named_exprs = out.named_exprs.len(),
        external_functions = out.external_functions.len(),
        "Collected expression leaves"
    );

    Ok(out)
}
