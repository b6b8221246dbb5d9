//! In-place mutation of existing components.
//!
//! Every setter that takes an expression re-points the component at a new
//! handle; nothing here edits an arena node.

use crate::types::{DomainInterval, Sense};
use tether_expr::ids::{
    ConstraintId, ExprId, NamedExprId, ObjectiveId, ParamId, SosId, VariableId,
};

use crate::model::Model;
use crate::model::error::ModelError;

impl Model {
    /// Fix a variable at `value`.
    pub fn fix(&mut self, id: VariableId, value: f64) -> Result<(), ModelError> {
        let variable = self.variable_mut(id)?;
        variable.value = Some(value);
        variable.fixed = true;
        Ok(())
    }

    /// Fix a variable at whatever value it currently holds.
    pub fn fix_at_current(&mut self, id: VariableId) -> Result<(), ModelError> {
        self.variable_mut(id)?.fixed = true;
        Ok(())
    }

    /// Release a fixed variable; its value is kept.
    pub fn unfix(&mut self, id: VariableId) -> Result<(), ModelError> {
        self.variable_mut(id)?.fixed = false;
        Ok(())
    }

    pub fn set_value(&mut self, id: VariableId, value: Option<f64>) -> Result<(), ModelError> {
        self.variable_mut(id)?.value = value;
        Ok(())
    }

    /// Point the lower bound at an existing expression (or drop it).
    pub fn set_lower(&mut self, id: VariableId, lower: Option<ExprId>) -> Result<(), ModelError> {
        self.ensure_optional_expr(lower)?;
        self.variable_mut(id)?.lower = lower;
        Ok(())
    }

    /// Point the upper bound at an existing expression (or drop it).
    pub fn set_upper(&mut self, id: VariableId, upper: Option<ExprId>) -> Result<(), ModelError> {
        self.ensure_optional_expr(upper)?;
        self.variable_mut(id)?.upper = upper;
        Ok(())
    }

    /// Replace the lower bound with a fresh constant node.
    pub fn set_lower_value(&mut self, id: VariableId, value: Option<f64>) -> Result<(), ModelError> {
        self.ensure_variable_exists(id)?;
        let lower = self.constant_bound(value);
        self.set_lower(id, lower)
    }

    /// Replace the upper bound with a fresh constant node.
    pub fn set_upper_value(&mut self, id: VariableId, value: Option<f64>) -> Result<(), ModelError> {
        self.ensure_variable_exists(id)?;
        let upper = self.constant_bound(value);
        self.set_upper(id, upper)
    }

    pub fn set_domain(&mut self, id: VariableId, domain: DomainInterval) -> Result<(), ModelError> {
        self.variable_mut(id)?.domain = domain;
        Ok(())
    }

    pub fn set_param_value(&mut self, id: ParamId, value: f64) -> Result<(), ModelError> {
        let param = self
            .params
            .get_mut(&id)
            .ok_or(ModelError::InvalidParamId(id))?;
        if !param.mutable {
            return Err(ModelError::ImmutableParam(id));
        }
        param.value = value;
        Ok(())
    }

    pub fn set_body(&mut self, id: ConstraintId, body: ExprId) -> Result<(), ModelError> {
        self.ensure_expr_exists(body)?;
        self.constraint_mut(id)?.body = body;
        Ok(())
    }

    /// Point both constraint bounds at existing expressions.
    pub fn set_constraint_bounds(
        &mut self,
        id: ConstraintId,
        lower: Option<ExprId>,
        upper: Option<ExprId>,
    ) -> Result<(), ModelError> {
        self.ensure_optional_expr(lower)?;
        self.ensure_optional_expr(upper)?;
        let constraint = self.constraint_mut(id)?;
        constraint.lower = lower;
        constraint.upper = upper;
        Ok(())
    }

    pub fn set_constraint_active(
        &mut self,
        id: ConstraintId,
        active: bool,
    ) -> Result<(), ModelError> {
        self.constraint_mut(id)?.active = active;
        Ok(())
    }

    pub fn set_sos_active(&mut self, id: SosId, active: bool) -> Result<(), ModelError> {
        self.sos_mut(id)?.active = active;
        Ok(())
    }

    pub fn set_sos_members(
        &mut self,
        id: SosId,
        members: Vec<(VariableId, f64)>,
    ) -> Result<(), ModelError> {
        if members.is_empty() {
            return Err(ModelError::EmptySos);
        }
        for (var_id, _) in &members {
            self.ensure_variable_exists(*var_id)?;
        }
        self.sos_mut(id)?.members = members;
        Ok(())
    }

    pub fn set_objective_active(
        &mut self,
        id: ObjectiveId,
        active: bool,
    ) -> Result<(), ModelError> {
        self.objective_mut(id)?.active = active;
        Ok(())
    }

    pub fn set_objective_expr(&mut self, id: ObjectiveId, expr: ExprId) -> Result<(), ModelError> {
        self.ensure_expr_exists(expr)?;
        self.objective_mut(id)?.expr = expr;
        Ok(())
    }

    pub fn set_objective_sense(&mut self, id: ObjectiveId, sense: Sense) -> Result<(), ModelError> {
        self.objective_mut(id)?.sense = sense;
        Ok(())
    }

    /// Redefine a named expression; all referrers see the new definition.
    pub fn set_named_expr(&mut self, id: NamedExprId, expr: ExprId) -> Result<(), ModelError> {
        self.ensure_expr_exists(expr)?;
        let named = self
            .named_exprs
            .get_mut(&id)
            .ok_or(ModelError::InvalidNamedExprId(id))?;
        named.expr = expr;
        Ok(())
    }

    // ── Removal ─────────────────────────────────────────────

    pub fn remove_variable(&mut self, id: VariableId) -> Result<(), ModelError> {
        self.variables
            .remove(&id)
            .map(|_| ())
            .ok_or(ModelError::InvalidVariableId(id))
    }

    pub fn remove_param(&mut self, id: ParamId) -> Result<(), ModelError> {
        self.params
            .remove(&id)
            .map(|_| ())
            .ok_or(ModelError::InvalidParamId(id))
    }

    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<(), ModelError> {
        self.constraints
            .remove(&id)
            .map(|_| ())
            .ok_or(ModelError::InvalidConstraintId(id))
    }

    pub fn remove_sos(&mut self, id: SosId) -> Result<(), ModelError> {
        self.sos_constraints
            .remove(&id)
            .map(|_| ())
            .ok_or(ModelError::InvalidSosId(id))
    }

    pub fn remove_objective(&mut self, id: ObjectiveId) -> Result<(), ModelError> {
        self.objectives
            .remove(&id)
            .map(|_| ())
            .ok_or(ModelError::InvalidObjectiveId(id))
    }
}
