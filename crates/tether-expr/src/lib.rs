pub mod expr;
pub mod ids;
pub mod walker;

pub use expr::{ExprArena, ExprError, Node};
pub use ids::{
    BlockId, ConstraintId, ExprId, NamedExprId, ObjectiveId, ParamId, SosId, VariableId,
};
pub use walker::{Collected, ExprSource, collect_vars_and_named_exprs};
