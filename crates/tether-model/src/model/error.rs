//! Model error types.

use tether_expr::ExprError;
use tether_expr::ids::{
    BlockId, ConstraintId, ExprId, NamedExprId, ObjectiveId, ParamId, SosId, VariableId,
};

/// Errors that can occur during model operations
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Invalid variable ID
    InvalidVariableId(VariableId),
    /// Invalid parameter ID
    InvalidParamId(ParamId),
    /// Invalid constraint ID
    InvalidConstraintId(ConstraintId),
    /// Invalid SOS constraint ID
    InvalidSosId(SosId),
    /// Invalid objective ID
    InvalidObjectiveId(ObjectiveId),
    /// Invalid named expression ID
    InvalidNamedExprId(NamedExprId),
    /// Invalid block ID
    InvalidBlockId(BlockId),
    /// Expression handle does not exist in the arena
    InvalidExpr(ExprId),
    /// Assigning a value to an immutable parameter
    ImmutableParam(ParamId),
    /// SOS constraint with no members
    EmptySos,
    /// Expression construction failed
    Expr(ExprError),
}

impl ModelError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::InvalidVariableId(_) => "VARIABLE_INVALID_ID",
            ModelError::InvalidParamId(_) => "PARAM_INVALID_ID",
            ModelError::InvalidConstraintId(_) => "CONSTRAINT_INVALID_ID",
            ModelError::InvalidSosId(_) => "SOS_INVALID_ID",
            ModelError::InvalidObjectiveId(_) => "OBJECTIVE_INVALID_ID",
            ModelError::InvalidNamedExprId(_) => "NAMED_EXPR_INVALID_ID",
            ModelError::InvalidBlockId(_) => "BLOCK_INVALID_ID",
            ModelError::InvalidExpr(_) => "EXPR_INVALID_ID",
            ModelError::ImmutableParam(_) => "PARAM_IMMUTABLE",
            ModelError::EmptySos => "SOS_EMPTY",
            ModelError::Expr(err) => err.code(),
        }
    }
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::InvalidVariableId(id) => {
                write!(f, "[{}] Variable ID {} does not exist", self.code(), id)
            }
            ModelError::InvalidParamId(id) => {
                write!(f, "[{}] Parameter ID {} does not exist", self.code(), id)
            }
            ModelError::InvalidConstraintId(id) => {
                write!(f, "[{}] Constraint ID {} does not exist", self.code(), id)
            }
            ModelError::InvalidSosId(id) => {
                write!(f, "[{}] SOS constraint ID {} does not exist", self.code(), id)
            }
            ModelError::InvalidObjectiveId(id) => {
                write!(f, "[{}] Objective ID {} does not exist", self.code(), id)
            }
            ModelError::InvalidNamedExprId(id) => write!(
                f,
                "[{}] Named expression ID {} does not exist",
                self.code(),
                id
            ),
            ModelError::InvalidBlockId(id) => {
                write!(f, "[{}] Block ID {} does not exist", self.code(), id)
            }
            ModelError::InvalidExpr(id) => {
                write!(f, "[{}] Expression {} does not exist", self.code(), id)
            }
            ModelError::ImmutableParam(id) => {
                write!(f, "[{}] Parameter {} is not mutable", self.code(), id)
            }
            ModelError::EmptySos => {
                write!(f, "[{}] SOS constraint needs at least one member", self.code())
            }
            ModelError::Expr(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<ExprError> for ModelError {
    fn from(err: ExprError) -> Self {
        ModelError::Expr(err)
    }
}
