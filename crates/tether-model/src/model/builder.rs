//! Model builder methods for adding components.

use crate::types::{
    Constraint, DomainInterval, NamedExpr, Objective, Param, Sense, SosConstraint, SosLevel,
    Variable,
};
use tether_expr::ids::{
    BlockId, ConstraintId, ExprId, NamedExprId, ObjectiveId, ParamId, SosId, VariableId,
};

use crate::model::Model;
use crate::model::error::ModelError;

impl Model {
    /// Add a variable to the model.
    pub fn add_variable(&mut self, variable: Variable) -> Result<VariableId, ModelError> {
        self.ensure_block_exists(variable.block)?;
        self.ensure_optional_expr(variable.lower)?;
        self.ensure_optional_expr(variable.upper)?;

        let id = VariableId::new(self.next_variable_id);
        self.next_variable_id += 1;
        self.variables.insert(id, variable);
        Ok(id)
    }

    /// Add an unfixed continuous variable with constant bounds.
    pub fn add_continuous(
        &mut self,
        block: BlockId,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Result<VariableId, ModelError> {
        let lower = self.constant_bound(lower);
        let upper = self.constant_bound(upper);
        self.add_variable(Variable {
            block,
            lower,
            upper,
            fixed: false,
            value: None,
            domain: DomainInterval::reals(),
        })
    }

    /// Add an unfixed binary variable.
    pub fn add_binary(&mut self, block: BlockId) -> Result<VariableId, ModelError> {
        self.add_variable(Variable {
            block,
            lower: None,
            upper: None,
            fixed: false,
            value: None,
            domain: DomainInterval::binary(),
        })
    }

    /// Add a parameter. Only mutable parameters are mirrored by a backend.
    pub fn add_param(
        &mut self,
        block: BlockId,
        value: f64,
        mutable: bool,
    ) -> Result<ParamId, ModelError> {
        self.ensure_block_exists(block)?;
        let id = ParamId::new(self.next_param_id);
        self.next_param_id += 1;
        self.params.insert(
            id,
            Param {
                block,
                value,
                mutable,
            },
        );
        Ok(id)
    }

    /// Add an active constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<ConstraintId, ModelError> {
        self.ensure_block_exists(constraint.block)?;
        self.ensure_optional_expr(constraint.lower)?;
        self.ensure_expr_exists(constraint.body)?;
        self.ensure_optional_expr(constraint.upper)?;

        let id = ConstraintId::new(self.next_constraint_id);
        self.next_constraint_id += 1;
        self.constraints.insert(id, constraint);
        Ok(id)
    }

    /// Add `lower <= body <= upper` with constant bounds.
    pub fn add_ranged_constraint(
        &mut self,
        block: BlockId,
        lower: Option<f64>,
        body: ExprId,
        upper: Option<f64>,
    ) -> Result<ConstraintId, ModelError> {
        let lower = self.constant_bound(lower);
        let upper = self.constant_bound(upper);
        self.add_constraint(Constraint {
            block,
            lower,
            body,
            upper,
            active: true,
        })
    }

    /// Add an active SOS constraint over weighted members.
    pub fn add_sos(
        &mut self,
        block: BlockId,
        level: SosLevel,
        members: Vec<(VariableId, f64)>,
    ) -> Result<SosId, ModelError> {
        self.ensure_block_exists(block)?;
        if members.is_empty() {
            return Err(ModelError::EmptySos);
        }
        for (var_id, _) in &members {
            self.ensure_variable_exists(*var_id)?;
        }

        let id = SosId::new(self.next_sos_id);
        self.next_sos_id += 1;
        self.sos_constraints.insert(
            id,
            SosConstraint {
                block,
                level,
                members,
                active: true,
            },
        );
        Ok(id)
    }

    /// Add an active objective.
    pub fn add_objective(
        &mut self,
        block: BlockId,
        expr: ExprId,
        sense: Sense,
    ) -> Result<ObjectiveId, ModelError> {
        self.ensure_block_exists(block)?;
        self.ensure_expr_exists(expr)?;

        let id = ObjectiveId::new(self.next_objective_id);
        self.next_objective_id += 1;
        self.objectives.insert(
            id,
            Objective {
                block,
                expr,
                sense,
                active: true,
            },
        );
        tracing::debug!(
            component = "model",
            operation = "add_objective",
            status = "success",
            objective = id.inner(),
            sense = sense.as_str(),
            "Added objective"
        );
        Ok(id)
    }

    /// Add a named expression wrapping `expr`.
    pub fn add_named_expr(
        &mut self,
        block: BlockId,
        expr: ExprId,
    ) -> Result<NamedExprId, ModelError> {
        self.ensure_block_exists(block)?;
        self.ensure_expr_exists(expr)?;

        let id = NamedExprId::new(self.next_named_expr_id);
        self.next_named_expr_id += 1;
        self.named_exprs.insert(id, NamedExpr { block, expr });
        Ok(id)
    }
}
