//! In-process backend that mirrors the model's shape and counts traffic.

use serde::Serialize;
use std::collections::BTreeSet;
use tether_expr::Node;
use tether_expr::ids::{ConstraintId, ObjectiveId, ParamId, SosId, VariableId};
use tether_model::Model;
use tether_solver::{BackendError, PersistentBackend};

/// Entities received per primitive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackendCalls {
    pub add_variables: usize,
    pub remove_variables: usize,
    pub update_variables: usize,
    pub add_params: usize,
    pub remove_params: usize,
    pub update_params: usize,
    pub add_constraints: usize,
    pub remove_constraints: usize,
    pub add_sos: usize,
    pub remove_sos: usize,
    pub set_objective: usize,
}

impl BackendCalls {
    pub fn total(&self) -> usize {
        self.add_variables
            + self.remove_variables
            + self.update_variables
            + self.add_params
            + self.remove_params
            + self.update_params
            + self.add_constraints
            + self.remove_constraints
            + self.add_sos
            + self.remove_sos
            + self.set_objective
    }

    /// Everything except parameter value refreshes.
    pub fn structural(&self) -> usize {
        self.total() - self.update_params
    }
}

/// Keeps the column/row sets a solver would hold and rejects traffic that
/// would corrupt them.
#[derive(Debug, Default)]
pub struct CountingBackend {
    calls: BackendCalls,
    columns: BTreeSet<VariableId>,
    params: BTreeSet<ParamId>,
    rows: BTreeSet<ConstraintId>,
    sos: BTreeSet<SosId>,
    objective: Option<ObjectiveId>,
    nonzeros: usize,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return and reset the counters.
    pub fn take_calls(&mut self) -> BackendCalls {
        std::mem::take(&mut self.calls)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn objective(&self) -> Option<ObjectiveId> {
        self.objective
    }

    /// Linear terms (or node operands) read while loading constraints.
    pub fn nonzeros(&self) -> usize {
        self.nonzeros
    }
}

fn insert_all<T: Ord + Copy + std::fmt::Debug>(
    set: &mut BTreeSet<T>,
    items: &[T],
    what: &str,
) -> Result<(), BackendError> {
    if let Some(item) = items.iter().find(|item| set.contains(item)) {
        return Err(BackendError::Internal(format!("{what} {item:?} already loaded")));
    }
    set.extend(items.iter().copied());
    Ok(())
}

fn remove_all<T: Ord + Copy + std::fmt::Debug>(
    set: &mut BTreeSet<T>,
    items: &[T],
    what: &str,
) -> Result<(), BackendError> {
    if let Some(item) = items.iter().find(|item| !set.contains(item)) {
        return Err(BackendError::Internal(format!("{what} {item:?} is not loaded")));
    }
    for item in items {
        set.remove(item);
    }
    Ok(())
}

impl PersistentBackend<Model> for CountingBackend {
    fn add_variables(&mut self, model: &Model, variables: &[VariableId]) -> Result<(), BackendError> {
        for var_id in variables {
            model
                .get_variable(*var_id)
                .map_err(|err| BackendError::Rejected(err.to_string()))?;
        }
        insert_all(&mut self.columns, variables, "column")?;
        self.calls.add_variables += variables.len();
        Ok(())
    }

    fn remove_variables(&mut self, variables: &[VariableId]) -> Result<(), BackendError> {
        remove_all(&mut self.columns, variables, "column")?;
        self.calls.remove_variables += variables.len();
        Ok(())
    }

    fn update_variables(
        &mut self,
        _model: &Model,
        variables: &[VariableId],
    ) -> Result<(), BackendError> {
        if let Some(var_id) = variables.iter().find(|var_id| !self.columns.contains(var_id)) {
            return Err(BackendError::Internal(format!(
                "column {var_id:?} is not loaded"
            )));
        }
        self.calls.update_variables += variables.len();
        Ok(())
    }

    fn add_params(&mut self, _model: &Model, params: &[ParamId]) -> Result<(), BackendError> {
        insert_all(&mut self.params, params, "param")?;
        self.calls.add_params += params.len();
        Ok(())
    }

    fn remove_params(&mut self, params: &[ParamId]) -> Result<(), BackendError> {
        remove_all(&mut self.params, params, "param")?;
        self.calls.remove_params += params.len();
        Ok(())
    }

    fn update_params(&mut self, _model: &Model) -> Result<(), BackendError> {
        self.calls.update_params += 1;
        Ok(())
    }

    fn add_constraints(
        &mut self,
        model: &Model,
        constraints: &[ConstraintId],
    ) -> Result<(), BackendError> {
        for con_id in constraints {
            let constraint = model
                .get_constraint(*con_id)
                .map_err(|err| BackendError::Rejected(err.to_string()))?;
            let body = model.exprs().get(constraint.body).ok_or_else(|| {
                BackendError::Rejected(format!("constraint {con_id:?} has no body"))
            })?;
            self.nonzeros += match body {
                Node::Linear { terms, .. } => terms.len(),
                other => other.children().len().max(1),
            };
        }
        insert_all(&mut self.rows, constraints, "row")?;
        self.calls.add_constraints += constraints.len();
        Ok(())
    }

    fn remove_constraints(&mut self, constraints: &[ConstraintId]) -> Result<(), BackendError> {
        remove_all(&mut self.rows, constraints, "row")?;
        self.calls.remove_constraints += constraints.len();
        Ok(())
    }

    fn add_sos_constraints(&mut self, _model: &Model, sos: &[SosId]) -> Result<(), BackendError> {
        insert_all(&mut self.sos, sos, "sos")?;
        self.calls.add_sos += sos.len();
        Ok(())
    }

    fn remove_sos_constraints(&mut self, sos: &[SosId]) -> Result<(), BackendError> {
        remove_all(&mut self.sos, sos, "sos")?;
        self.calls.remove_sos += sos.len();
        Ok(())
    }

    fn set_objective(
        &mut self,
        _model: &Model,
        objective: Option<ObjectiveId>,
    ) -> Result<(), BackendError> {
        self.objective = objective;
        self.calls.set_objective += 1;
        Ok(())
    }
}
