//! Component access and enumeration from a root block.

use crate::types::{Constraint, NamedExpr, Objective, Param, SosConstraint, Variable};
use tether_expr::ids::{
    BlockId, ConstraintId, NamedExprId, ObjectiveId, ParamId, SosId, VariableId,
};

use super::Model;
use super::error::ModelError;

impl Model {
    /// Get the number of variables
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Get the number of constraints
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Get the number of SOS constraints
    pub fn num_sos_constraints(&self) -> usize {
        self.sos_constraints.len()
    }

    /// Get a variable by ID.
    pub fn get_variable(&self, id: VariableId) -> Result<&Variable, ModelError> {
        self.variables
            .get(&id)
            .ok_or(ModelError::InvalidVariableId(id))
    }

    /// Get a parameter by ID.
    pub fn get_param(&self, id: ParamId) -> Result<&Param, ModelError> {
        self.params.get(&id).ok_or(ModelError::InvalidParamId(id))
    }

    /// Get a constraint by ID.
    pub fn get_constraint(&self, id: ConstraintId) -> Result<&Constraint, ModelError> {
        self.constraints
            .get(&id)
            .ok_or(ModelError::InvalidConstraintId(id))
    }

    /// Get an SOS constraint by ID.
    pub fn get_sos(&self, id: SosId) -> Result<&SosConstraint, ModelError> {
        self.sos_constraints
            .get(&id)
            .ok_or(ModelError::InvalidSosId(id))
    }

    /// Get an objective by ID.
    pub fn get_objective(&self, id: ObjectiveId) -> Result<&Objective, ModelError> {
        self.objectives
            .get(&id)
            .ok_or(ModelError::InvalidObjectiveId(id))
    }

    /// Get a named expression by ID.
    pub fn get_named_expr(&self, id: NamedExprId) -> Result<&NamedExpr, ModelError> {
        self.named_exprs
            .get(&id)
            .ok_or(ModelError::InvalidNamedExprId(id))
    }

    // ── Enumeration (descends into child blocks) ────────────

    /// All variables declared in `root` or below.
    pub fn variables_in(&self, root: BlockId) -> Vec<VariableId> {
        self.variables
            .iter()
            .filter(|(_, variable)| self.is_within(variable.block, root))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Mutable parameters declared in `root` or below.
    pub fn mutable_params_in(&self, root: BlockId) -> Vec<ParamId> {
        self.params
            .iter()
            .filter(|(_, param)| param.mutable && self.is_within(param.block, root))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Active constraints declared in `root` or below.
    pub fn active_constraints_in(&self, root: BlockId) -> Vec<ConstraintId> {
        self.constraints
            .iter()
            .filter(|(_, constraint)| constraint.active && self.is_within(constraint.block, root))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Active SOS constraints declared in `root` or below.
    pub fn active_sos_in(&self, root: BlockId) -> Vec<SosId> {
        self.sos_constraints
            .iter()
            .filter(|(_, sos)| sos.active && self.is_within(sos.block, root))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Active objectives declared in `root` or below.
    pub fn active_objectives_in(&self, root: BlockId) -> Vec<ObjectiveId> {
        self.objectives
            .iter()
            .filter(|(_, objective)| objective.active && self.is_within(objective.block, root))
            .map(|(id, _)| *id)
            .collect()
    }
}
