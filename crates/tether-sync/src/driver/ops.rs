//! Validated primitives behind every public add/remove/update entry point.
//!
//! Each primitive checks the whole batch before touching the backend, then
//! updates the registry, reference tracker and store around one backend
//! call. Empty batches never reach the backend.

use std::collections::BTreeSet;
use tether_expr::ids::{ConstraintId, ObjectiveId, ParamId, SosId, VariableId};
use tether_expr::{Collected, ExprSource, collect_vars_and_named_exprs};
use tether_solver::PersistentBackend;
use tracing::{debug, trace};

use super::{PersistentSync, distinct};
use crate::error::{EntityKind, SyncError};
use crate::fixed::UnfixGuard;
use crate::refs::Referrer;
use crate::source::{ConstraintExprs, SourceModel};
use crate::store::{ConstraintRecord, ObjectiveRecord, SosRecord, snapshot_named};

impl<M, B> PersistentSync<M, B>
where
    M: SourceModel + ?Sized,
    B: PersistentBackend<M>,
{
    pub(super) fn insert_variables(
        &mut self,
        model: &M,
        variables: &[VariableId],
    ) -> Result<(), SyncError> {
        let batch = distinct(variables, EntityKind::Variable, VariableId::inner)?;
        let mut states = Vec::with_capacity(batch.len());
        for var_id in &batch {
            if self.registry.contains_variable(*var_id) {
                return Err(SyncError::duplicate(EntityKind::Variable, var_id.inner()));
            }
            let state = model
                .variable_state(*var_id)
                .ok_or_else(|| SyncError::unknown(EntityKind::Variable, var_id.inner()))?;
            states.push(state);
        }
        if batch.is_empty() {
            return Ok(());
        }

        for (var_id, state) in batch.iter().zip(states) {
            self.registry.register_variable(*var_id, state)?;
            self.refs.track(*var_id);
        }
        self.backend.add_variables(model, &batch)?;
        self.counts.variables_added += batch.len();
        debug!(
            component = "sync",
            operation = "add_variables",
            status = "success",
            count = batch.len(),
            "Added variables"
        );
        Ok(())
    }

    pub(super) fn insert_params(&mut self, model: &M, params: &[ParamId]) -> Result<(), SyncError> {
        let batch = distinct(params, EntityKind::Param, ParamId::inner)?;
        for param_id in &batch {
            if self.registry.contains_param(*param_id) {
                return Err(SyncError::duplicate(EntityKind::Param, param_id.inner()));
            }
            if !model.has_param(*param_id) {
                return Err(SyncError::unknown(EntityKind::Param, param_id.inner()));
            }
        }
        if batch.is_empty() {
            return Ok(());
        }

        for param_id in &batch {
            self.registry.register_param(*param_id)?;
        }
        self.backend.add_params(model, &batch)?;
        self.counts.params_added += batch.len();
        debug!(
            component = "sync",
            operation = "add_params",
            status = "success",
            count = batch.len(),
            "Added parameters"
        );
        Ok(())
    }

    /// Walk, register, link and record every constraint, then hand the batch
    /// to the backend with its fixed variables released when fixed
    /// variables are not treated as constants.
    ///
    /// Unseen mutable parameters are added before unseen variables, and both
    /// before the constraints.
    pub(super) fn insert_constraints(
        &mut self,
        model: &mut M,
        constraints: &[ConstraintId],
    ) -> Result<(), SyncError> {
        let batch = distinct(constraints, EntityKind::Constraint, ConstraintId::inner)?;
        let mut prepared = Vec::with_capacity(batch.len());
        for con_id in &batch {
            if self.store.contains_constraint(*con_id) {
                return Err(SyncError::duplicate(EntityKind::Constraint, con_id.inner()));
            }
            let exprs = model
                .constraint_exprs(*con_id)
                .ok_or_else(|| SyncError::unknown(EntityKind::Constraint, con_id.inner()))?;
            let mut collected = collect_vars_and_named_exprs(&*model, exprs.body)?;
            collected.params = with_bound_params(&*model, &exprs, collected.params)?;
            self.ensure_variables_known(&collected.variables)?;
            prepared.push((*con_id, exprs, collected));
        }
        if batch.is_empty() {
            return Ok(());
        }

        let params: Vec<ParamId> = prepared
            .iter()
            .flat_map(|(_, _, collected)| collected.params.iter().copied())
            .collect();
        self.register_referenced_params(&*model, &params)?;
        let referenced: Vec<VariableId> = prepared
            .iter()
            .flat_map(|(_, _, collected)| collected.variables.iter().copied())
            .collect();
        self.register_referenced(&*model, &referenced)?;

        let mut fixed = BTreeSet::new();
        for (con_id, exprs, collected) in prepared {
            let Collected {
                named_exprs,
                variables,
                fixed_variables,
                params,
                external_functions,
            } = collected;
            for var_id in &variables {
                self.refs.link(*var_id, Referrer::Constraint(con_id))?;
            }
            fixed.extend(fixed_variables);
            let record = ConstraintRecord {
                exprs,
                variables,
                params,
                named_exprs: snapshot_named(&*model, &named_exprs),
                external_functions,
            };
            self.store.record_constraint(con_id, record)?;
        }

        let released = self.released(fixed);
        let guard = UnfixGuard::new(model, released);
        self.backend.add_constraints(guard.model(), &batch)?;
        let released = guard.released().len();
        drop(guard);

        self.counts.constraints_added += batch.len();
        debug!(
            component = "sync",
            operation = "add_constraints",
            status = "success",
            count = batch.len(),
            released_fixed = released,
            "Added constraints"
        );
        Ok(())
    }

    pub(super) fn insert_sos(&mut self, model: &M, sos: &[SosId]) -> Result<(), SyncError> {
        let batch = distinct(sos, EntityKind::Sos, SosId::inner)?;
        let mut prepared = Vec::with_capacity(batch.len());
        for sos_id in &batch {
            if self.store.contains_sos(*sos_id) {
                return Err(SyncError::duplicate(EntityKind::Sos, sos_id.inner()));
            }
            let state = model
                .sos_state(*sos_id)
                .ok_or_else(|| SyncError::unknown(EntityKind::Sos, sos_id.inner()))?;
            self.ensure_variables_known(&state.variables())?;
            prepared.push((*sos_id, state));
        }
        if batch.is_empty() {
            return Ok(());
        }

        let referenced: Vec<VariableId> = prepared
            .iter()
            .flat_map(|(_, state)| state.variables())
            .collect();
        self.register_referenced(model, &referenced)?;

        for (sos_id, state) in prepared {
            for var_id in state.variables() {
                self.refs.link(var_id, Referrer::Sos(sos_id))?;
            }
            self.store.record_sos(sos_id, SosRecord { state })?;
        }
        self.backend.add_sos_constraints(model, &batch)?;
        self.counts.sos_added += batch.len();
        debug!(
            component = "sync",
            operation = "add_sos_constraints",
            status = "success",
            count = batch.len(),
            "Added SOS constraints"
        );
        Ok(())
    }

    /// Retire the recorded objective, then install `objective`.
    ///
    /// Variables shared by both objectives are unlinked and relinked before
    /// any orphan flush, so they are never removed in between.
    pub(super) fn install_objective(
        &mut self,
        model: &mut M,
        objective: Option<ObjectiveId>,
    ) -> Result<(), SyncError> {
        let prepared = match objective {
            Some(obj_id) => {
                let state = model
                    .objective_state(obj_id)
                    .ok_or_else(|| SyncError::unknown(EntityKind::Objective, obj_id.inner()))?;
                let collected = collect_vars_and_named_exprs(&*model, state.expr)?;
                self.ensure_variables_known(&collected.variables)?;
                Some((obj_id, state, collected))
            }
            None => None,
        };

        if let Some(old) = self.store.take_objective() {
            for var_id in &old.variables {
                self.release(*var_id, Referrer::Objective(old.id));
            }
            trace!(
                component = "sync",
                operation = "set_objective",
                status = "success",
                objective = old.id.inner(),
                variables = old.variables.len(),
                "Retired objective"
            );
        }

        let Some((obj_id, state, collected)) = prepared else {
            self.backend.set_objective(&*model, None)?;
            self.counts.objective_sets += 1;
            debug!(
                component = "sync",
                operation = "set_objective",
                status = "success",
                has_objective = false,
                "Cleared objective"
            );
            return Ok(());
        };

        self.register_referenced_params(&*model, &collected.params)?;
        self.register_referenced(&*model, &collected.variables)?;
        let Collected {
            named_exprs,
            variables,
            fixed_variables,
            params,
            external_functions,
        } = collected;
        for var_id in &variables {
            self.refs.link(*var_id, Referrer::Objective(obj_id))?;
        }
        let record = ObjectiveRecord {
            id: obj_id,
            state,
            named_exprs: snapshot_named(&*model, &named_exprs),
            variables,
            params,
            external_functions,
        };
        let variable_count = record.variables.len();
        self.store.record_objective(record);

        let released = self.released(fixed_variables.into_iter().collect());
        let guard = UnfixGuard::new(model, released);
        self.backend.set_objective(guard.model(), Some(obj_id))?;
        drop(guard);

        self.counts.objective_sets += 1;
        debug!(
            component = "sync",
            operation = "set_objective",
            status = "success",
            has_objective = true,
            objective = obj_id.inner(),
            sense = state.sense.as_str(),
            variables = variable_count,
            "Installed objective"
        );
        Ok(())
    }

    pub(super) fn drop_constraints(&mut self, constraints: &[ConstraintId]) -> Result<(), SyncError> {
        let batch = distinct(constraints, EntityKind::Constraint, ConstraintId::inner)?;
        for con_id in &batch {
            if !self.store.contains_constraint(*con_id) {
                return Err(SyncError::unknown(EntityKind::Constraint, con_id.inner()));
            }
        }
        if batch.is_empty() {
            return Ok(());
        }

        self.backend.remove_constraints(&batch)?;
        for con_id in &batch {
            let record = self.store.take_constraint(*con_id)?;
            for var_id in &record.variables {
                self.release(*var_id, Referrer::Constraint(*con_id));
            }
        }
        self.counts.constraints_removed += batch.len();
        debug!(
            component = "sync",
            operation = "remove_constraints",
            status = "success",
            count = batch.len(),
            pending_orphans = self.orphans.len(),
            "Removed constraints"
        );
        Ok(())
    }

    pub(super) fn drop_sos(&mut self, sos: &[SosId]) -> Result<(), SyncError> {
        let batch = distinct(sos, EntityKind::Sos, SosId::inner)?;
        for sos_id in &batch {
            if !self.store.contains_sos(*sos_id) {
                return Err(SyncError::unknown(EntityKind::Sos, sos_id.inner()));
            }
        }
        if batch.is_empty() {
            return Ok(());
        }

        self.backend.remove_sos_constraints(&batch)?;
        for sos_id in &batch {
            let record = self.store.take_sos(*sos_id)?;
            for var_id in record.state.variables() {
                self.release(var_id, Referrer::Sos(*sos_id));
            }
        }
        self.counts.sos_removed += batch.len();
        debug!(
            component = "sync",
            operation = "remove_sos_constraints",
            status = "success",
            count = batch.len(),
            "Removed SOS constraints"
        );
        Ok(())
    }

    pub(super) fn drop_params(&mut self, params: &[ParamId]) -> Result<(), SyncError> {
        let batch = distinct(params, EntityKind::Param, ParamId::inner)?;
        for param_id in &batch {
            if !self.registry.contains_param(*param_id) {
                return Err(SyncError::unknown(EntityKind::Param, param_id.inner()));
            }
        }
        if batch.is_empty() {
            return Ok(());
        }

        self.backend.remove_params(&batch)?;
        for param_id in &batch {
            self.registry.unregister_param(*param_id)?;
        }
        self.counts.params_removed += batch.len();
        debug!(
            component = "sync",
            operation = "remove_params",
            status = "success",
            count = batch.len(),
            "Removed parameters"
        );
        Ok(())
    }

    pub(super) fn drop_variables(&mut self, variables: &[VariableId]) -> Result<(), SyncError> {
        let batch = distinct(variables, EntityKind::Variable, VariableId::inner)?;
        for var_id in &batch {
            if !self.registry.contains_variable(*var_id) {
                return Err(SyncError::unknown(EntityKind::Variable, var_id.inner()));
            }
            self.refs.ensure_removable(*var_id)?;
        }
        if batch.is_empty() {
            return Ok(());
        }

        self.backend.remove_variables(&batch)?;
        for var_id in &batch {
            self.registry.unregister_variable(*var_id, &mut self.refs)?;
            self.orphans.remove(var_id);
        }
        self.counts.variables_removed += batch.len();
        debug!(
            component = "sync",
            operation = "remove_variables",
            status = "success",
            count = batch.len(),
            "Removed variables"
        );
        Ok(())
    }

    /// Remove queued variables that are still tracked and unreferenced.
    pub(super) fn flush_orphans(&mut self) -> Result<(), SyncError> {
        let queued = std::mem::take(&mut self.orphans);
        let removable: Vec<VariableId> = queued
            .into_iter()
            .filter(|var_id| {
                self.registry.contains_variable(*var_id) && self.refs.is_removable(*var_id)
            })
            .collect();
        self.drop_variables(&removable)
    }

    pub(super) fn refresh_variables(
        &mut self,
        model: &M,
        variables: &[VariableId],
    ) -> Result<(), SyncError> {
        let batch = distinct(variables, EntityKind::Variable, VariableId::inner)?;
        let mut states = Vec::with_capacity(batch.len());
        for var_id in &batch {
            if !self.registry.contains_variable(*var_id) {
                return Err(SyncError::unknown(EntityKind::Variable, var_id.inner()));
            }
            let state = model
                .variable_state(*var_id)
                .ok_or_else(|| SyncError::unknown(EntityKind::Variable, var_id.inner()))?;
            states.push(state);
        }
        if batch.is_empty() {
            return Ok(());
        }

        for (var_id, state) in batch.iter().zip(states) {
            self.registry.update_variable(*var_id, state)?;
        }
        self.backend.update_variables(model, &batch)?;
        self.counts.variables_updated += batch.len();
        debug!(
            component = "sync",
            operation = "update_variables",
            status = "success",
            count = batch.len(),
            "Updated variables"
        );
        Ok(())
    }

    pub(super) fn refresh_params(&mut self, model: &M) -> Result<(), SyncError> {
        self.backend.update_params(model)?;
        self.counts.param_refreshes += 1;
        trace!(
            component = "sync",
            operation = "update_params",
            status = "success",
            params = self.registry.num_params(),
            "Refreshed parameter values"
        );
        Ok(())
    }

    /// Register variables first seen through a referrer.
    fn register_referenced(&mut self, model: &M, variables: &[VariableId]) -> Result<(), SyncError> {
        if self.only_child_vars {
            return Ok(());
        }
        let mut seen = BTreeSet::new();
        let new_vars: Vec<VariableId> = variables
            .iter()
            .copied()
            .filter(|var_id| !self.registry.contains_variable(*var_id) && seen.insert(*var_id))
            .collect();
        self.insert_variables(model, &new_vars)
    }

    /// Register mutable parameters first seen through a referrer.
    fn register_referenced_params(
        &mut self,
        model: &M,
        params: &[ParamId],
    ) -> Result<(), SyncError> {
        let mut seen = BTreeSet::new();
        let new_params: Vec<ParamId> = params
            .iter()
            .copied()
            .filter(|param_id| {
                !self.registry.contains_param(*param_id)
                    && model.is_mutable_param(*param_id)
                    && seen.insert(*param_id)
            })
            .collect();
        self.insert_params(model, &new_params)
    }

    /// With `only_child_vars` every referenced variable must already be tracked.
    fn ensure_variables_known(&self, variables: &[VariableId]) -> Result<(), SyncError> {
        if !self.only_child_vars {
            return Ok(());
        }
        match variables
            .iter()
            .find(|var_id| !self.registry.contains_variable(**var_id))
        {
            Some(var_id) => Err(SyncError::unknown(EntityKind::Variable, var_id.inner())),
            None => Ok(()),
        }
    }

    /// Fixed variables to release around a backend add.
    fn released(&self, fixed: BTreeSet<VariableId>) -> Vec<VariableId> {
        if self.config.treat_fixed_vars_as_params {
            Vec::new()
        } else {
            fixed.into_iter().collect()
        }
    }

    /// Drop one reference and queue the variable if it became unreferenced.
    fn release(&mut self, var_id: VariableId, referrer: Referrer) {
        if self.refs.unlink(var_id, referrer) && !self.only_child_vars {
            self.orphans.insert(var_id);
        }
    }
}

/// Append the parameters found in either bound to those of the body.
fn with_bound_params<S: ExprSource + ?Sized>(
    source: &S,
    exprs: &ConstraintExprs,
    mut params: Vec<ParamId>,
) -> Result<Vec<ParamId>, SyncError> {
    for bound in [exprs.lower, exprs.upper].into_iter().flatten() {
        for param_id in collect_vars_and_named_exprs(source, bound)?.params {
            if !params.contains(&param_id) {
                params.push(param_id);
            }
        }
    }
    Ok(params)
}
