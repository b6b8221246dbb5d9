//! Expression construction and traversal errors.

use crate::ids::{ExprId, NamedExprId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// A handle points past the end of the arena.
    UnknownNode(ExprId),
    /// A named expression handle has no definition.
    UnknownNamedExpr(NamedExprId),
    MismatchedLengths { variables: usize, coefficients: usize },
}

impl ExprError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ExprError::UnknownNode(_) => "EXPR_UNKNOWN_NODE",
            ExprError::UnknownNamedExpr(_) => "EXPR_UNKNOWN_NAMED",
            ExprError::MismatchedLengths { .. } => "EXPR_MISMATCHED_LENGTHS",
        }
    }
}

impl std::fmt::Display for ExprError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExprError::UnknownNode(id) => {
                write!(f, "[{}] Expression node {} does not exist", self.code(), id)
            }
            ExprError::UnknownNamedExpr(id) => write!(
                f,
                "[{}] Named expression {} is not defined",
                self.code(),
                id
            ),
            ExprError::MismatchedLengths {
                variables,
                coefficients,
            } => write!(
                f,
                "[{}] variables ({}) and coefficients ({}) must have the same length",
                self.code(),
                variables,
                coefficients
            ),
        }
    }
}

impl std::error::Error for ExprError {}
