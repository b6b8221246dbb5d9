//! Read access to the live model, plus the one mutation sync needs.

use tether_expr::ExprSource;
use tether_expr::ids::{
    BlockId, ConstraintId, ExprId, ObjectiveId, ParamId, SosId, VariableId,
};
use tether_model::{DomainInterval, Model, Sense, SosLevel};

use crate::error::SyncError;

/// Attributes of a variable that a backend mirrors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableState {
    pub lower: Option<ExprId>,
    pub upper: Option<ExprId>,
    pub fixed: bool,
    pub value: Option<f64>,
    pub domain: DomainInterval,
}

/// Expression handles of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintExprs {
    pub lower: Option<ExprId>,
    pub body: ExprId,
    pub upper: Option<ExprId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SosState {
    pub level: SosLevel,
    pub members: Vec<(VariableId, f64)>,
}

impl SosState {
    pub fn variables(&self) -> Vec<VariableId> {
        self.members.iter().map(|(var_id, _)| *var_id).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectiveState {
    pub expr: ExprId,
    pub sense: Sense,
}

/// Source model collaborator of a synchronization pass.
///
/// Enumeration from a block descends into all of its child blocks and only
/// yields active constraints, SOS constraints and objectives, and mutable
/// parameters. Every `*_state` query returns `None` for a handle the model
/// no longer holds.
pub trait SourceModel: ExprSource {
    fn block_variables(&self, block: BlockId) -> Vec<VariableId>;
    fn block_params(&self, block: BlockId) -> Vec<ParamId>;
    fn block_constraints(&self, block: BlockId) -> Vec<ConstraintId>;
    fn block_sos(&self, block: BlockId) -> Vec<SosId>;
    fn block_objectives(&self, block: BlockId) -> Vec<ObjectiveId>;

    fn variable_state(&self, id: VariableId) -> Option<VariableState>;
    fn has_param(&self, id: ParamId) -> bool;
    /// `false` for immutable or unknown parameters.
    fn is_mutable_param(&self, id: ParamId) -> bool;
    fn constraint_exprs(&self, id: ConstraintId) -> Option<ConstraintExprs>;
    fn sos_state(&self, id: SosId) -> Option<SosState>;
    fn objective_state(&self, id: ObjectiveId) -> Option<ObjectiveState>;

    /// Set the fixed flag, keeping the value. Unknown handles are ignored.
    fn set_fixed(&mut self, id: VariableId, fixed: bool);
}

/// The single active objective below `block`, if any.
pub fn get_objective<M: SourceModel + ?Sized>(
    model: &M,
    block: BlockId,
) -> Result<Option<ObjectiveId>, SyncError> {
    let objectives = model.block_objectives(block);
    match objectives.as_slice() {
        [] => Ok(None),
        [objective] => Ok(Some(*objective)),
        _ => Err(SyncError::MultipleObjectives {
            block,
            count: objectives.len(),
        }),
    }
}

impl SourceModel for Model {
    fn block_variables(&self, block: BlockId) -> Vec<VariableId> {
        self.variables_in(block)
    }

    fn block_params(&self, block: BlockId) -> Vec<ParamId> {
        self.mutable_params_in(block)
    }

    fn block_constraints(&self, block: BlockId) -> Vec<ConstraintId> {
        self.active_constraints_in(block)
    }

    fn block_sos(&self, block: BlockId) -> Vec<SosId> {
        self.active_sos_in(block)
    }

    fn block_objectives(&self, block: BlockId) -> Vec<ObjectiveId> {
        self.active_objectives_in(block)
    }

    fn variable_state(&self, id: VariableId) -> Option<VariableState> {
        self.get_variable(id).ok().map(|variable| VariableState {
            lower: variable.lower,
            upper: variable.upper,
            fixed: variable.fixed,
            value: variable.value,
            domain: variable.domain,
        })
    }

    fn has_param(&self, id: ParamId) -> bool {
        self.get_param(id).is_ok()
    }

    fn is_mutable_param(&self, id: ParamId) -> bool {
        self.get_param(id).is_ok_and(|param| param.mutable)
    }

    fn constraint_exprs(&self, id: ConstraintId) -> Option<ConstraintExprs> {
        self.get_constraint(id).ok().map(|constraint| ConstraintExprs {
            lower: constraint.lower,
            body: constraint.body,
            upper: constraint.upper,
        })
    }

    fn sos_state(&self, id: SosId) -> Option<SosState> {
        self.get_sos(id).ok().map(|sos| SosState {
            level: sos.level,
            members: sos.members.clone(),
        })
    }

    fn objective_state(&self, id: ObjectiveId) -> Option<ObjectiveState> {
        self.get_objective(id).ok().map(|objective| ObjectiveState {
            expr: objective.expr,
            sense: objective.sense,
        })
    }

    fn set_fixed(&mut self, id: VariableId, fixed: bool) {
        let result = if fixed {
            self.fix_at_current(id)
        } else {
            self.unfix(id)
        };
        if let Err(err) = result {
            tracing::trace!(
                component = "sync",
                operation = "set_fixed",
                status = "skipped",
                variable = id.inner(),
                error = %err,
                "Variable vanished before its fixed flag could be restored"
            );
        }
    }
}
