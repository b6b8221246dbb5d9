//! The synchronization pass.
//!
//! Phases run in a fixed order:
//!
//! 1. discover new and removed entities below the root block
//! 2. remove stale constraints, SOS constraints and parameters
//! 3. refresh parameter values, then add parameters, variables, constraints
//!    and SOS constraints
//! 4. diff surviving constraints, SOS constraints and variables
//! 5. detect redefined named expressions and replace changed constraints
//! 6. reset the objective if it changed
//! 7. remove variables that left the model or lost their last reference
//!
//! Variables orphaned in phases 2 to 6 stay tracked until phase 7, so a
//! constraint that is removed and added again never drops its variables.

use std::collections::BTreeSet;
use std::time::Instant;
use tether_expr::ids::{BlockId, ConstraintId, ParamId, SosId, VariableId};
use tether_solver::PersistentBackend;
use tether_tools::{HierarchicalTimer, MemorySnapshot};
use tracing::{debug, error, info, trace};

use super::PersistentSync;
use crate::error::SyncError;
use crate::registry::VariableChange;
use crate::report::{SyncCounts, SyncReport};
use crate::source::{SourceModel, get_objective};
use crate::store::ChangeKind;

/// Entities found by the discovery phase.
#[derive(Debug, Default)]
struct Discovery {
    new_vars: Vec<VariableId>,
    absent_vars: Vec<VariableId>,
    new_params: Vec<ParamId>,
    removed_params: Vec<ParamId>,
    current_cons: Vec<ConstraintId>,
    new_cons: Vec<ConstraintId>,
    removed_cons: Vec<ConstraintId>,
    current_sos: Vec<SosId>,
    new_sos: Vec<SosId>,
    removed_sos: Vec<SosId>,
}

/// Split `current` against `tracked` into (new, removed).
fn split_new_removed<T: Ord + Copy>(current: &[T], tracked: &[T]) -> (Vec<T>, Vec<T>) {
    let current_set: BTreeSet<T> = current.iter().copied().collect();
    let tracked_set: BTreeSet<T> = tracked.iter().copied().collect();
    let new = current
        .iter()
        .copied()
        .filter(|item| !tracked_set.contains(item))
        .collect();
    let removed = tracked
        .iter()
        .copied()
        .filter(|item| !current_set.contains(item))
        .collect();
    (new, removed)
}

impl<M, B> PersistentSync<M, B>
where
    M: SourceModel + ?Sized,
    B: PersistentBackend<M>,
{
    /// Bring the backend in line with the model using a private timer.
    pub fn synchronize(&mut self, model: &mut M) -> Result<SyncReport, SyncError> {
        let mut timer = HierarchicalTimer::new();
        self.synchronize_with_timer(model, &mut timer)
    }

    /// Bring the backend in line with the model, timing the `vars`,
    /// `params`, `cons`, `named_exprs` and `objective` sections on `timer`.
    ///
    /// Running twice with no model change in between makes no structural
    /// backend call the second time.
    pub fn synchronize_with_timer(
        &mut self,
        model: &mut M,
        timer: &mut HierarchicalTimer,
    ) -> Result<SyncReport, SyncError> {
        let Some(root) = self.root else {
            let err = SyncError::NotInitialized;
            super::log_failure("synchronize", &err);
            return Err(err);
        };

        let started = Instant::now();
        let rss_before = MemorySnapshot::try_capture("sync_start");
        self.counts = SyncCounts::default();

        let objective_reset = match self.run_phases(model, root, timer) {
            Ok(objective_reset) => objective_reset,
            Err(err) => {
                timer.abandon_open();
                error!(
                    component = "sync",
                    operation = "synchronize",
                    status = "error",
                    code = err.code(),
                    error = %err,
                    duration_ms = started.elapsed().as_secs_f64() * 1000.0,
                    "Synchronization aborted; backend may be partially updated"
                );
                return Err(err);
            }
        };

        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        let rss_after = MemorySnapshot::try_capture("sync_end");
        let rss_delta = match (&rss_before, &rss_after) {
            (Some(before), Some(after)) => Some(after.delta_since(before)),
            _ => None,
        };
        let rss_bytes = rss_after.map(|snapshot| snapshot.rss_bytes);
        let counts = self.counts;

        info!(
            component = "sync",
            operation = "synchronize",
            status = "success",
            variables_added = counts.variables_added,
            variables_removed = counts.variables_removed,
            variables_updated = counts.variables_updated,
            constraints_added = counts.constraints_added,
            constraints_removed = counts.constraints_removed,
            sos_added = counts.sos_added,
            sos_removed = counts.sos_removed,
            params_added = counts.params_added,
            params_removed = counts.params_removed,
            objective_reset,
            duration_ms,
            rss_bytes = ?rss_bytes,
            rss_delta_bytes = ?rss_delta,
            "Synchronization completed"
        );

        Ok(SyncReport {
            counts,
            objective_reset,
            duration_ms,
            rss_bytes,
            rss_delta_bytes: rss_delta,
            timings: timer.entries(),
        })
    }

    fn run_phases(
        &mut self,
        model: &mut M,
        root: BlockId,
        timer: &mut HierarchicalTimer,
    ) -> Result<bool, SyncError> {
        let config = self.config;
        let found = self.discover(&*model, root, timer);

        // Phase 2: removals first so additions never see stale references.
        timer.start("cons");
        self.drop_constraints(&found.removed_cons)?;
        self.drop_sos(&found.removed_sos)?;
        timer.stop("cons");
        timer.start("params");
        self.drop_params(&found.removed_params)?;

        // Phase 3
        if config.update_params && self.registry.num_params() > 0 {
            self.refresh_params(&*model)?;
        }
        self.insert_params(&*model, &found.new_params)?;
        timer.stop("params");
        timer.start("vars");
        self.insert_variables(&*model, &found.new_vars)?;
        timer.stop("vars");
        timer.start("cons");
        self.insert_constraints(model, &found.new_cons)?;
        self.insert_sos(&*model, &found.new_sos)?;

        // Phase 4
        let new_cons: BTreeSet<ConstraintId> = found.new_cons.iter().copied().collect();
        let new_sos: BTreeSet<SosId> = found.new_sos.iter().copied().collect();
        let mut replace: BTreeSet<ConstraintId> = BTreeSet::new();
        let mut reset_objective = false;

        if config.update_constraints {
            for con_id in &found.current_cons {
                if new_cons.contains(con_id) || !self.store.contains_constraint(*con_id) {
                    continue;
                }
                let Some(exprs) = model.constraint_exprs(*con_id) else {
                    continue;
                };
                let kind = self.store.diff_constraint(*con_id, &exprs, &*model)?;
                let queue = match kind {
                    ChangeKind::Unchanged => false,
                    ChangeKind::NamedExprChanged => config.update_named_expressions,
                    ChangeKind::BodyChanged | ChangeKind::BoundsChanged => true,
                };
                if queue {
                    trace!(
                        component = "sync",
                        operation = "diff_constraint",
                        status = "success",
                        constraint = con_id.inner(),
                        change = kind.as_str(),
                        "Constraint queued for replacement"
                    );
                    replace.insert(*con_id);
                }
            }

            let mut changed_sos = Vec::new();
            for sos_id in &found.current_sos {
                if new_sos.contains(sos_id) || !self.store.contains_sos(*sos_id) {
                    continue;
                }
                let Some(state) = model.sos_state(*sos_id) else {
                    continue;
                };
                if self.store.diff_sos(*sos_id, &state)?.is_changed() {
                    changed_sos.push(*sos_id);
                }
            }
            self.drop_sos(&changed_sos)?;
            self.insert_sos(&*model, &changed_sos)?;
        }
        timer.stop("cons");

        timer.start("vars");
        if config.update_vars {
            let absent: BTreeSet<VariableId> = found.absent_vars.iter().copied().collect();
            let mut changed = Vec::new();
            for var_id in self.registry.variable_ids() {
                if absent.contains(&var_id)
                    || (self.orphans.contains(&var_id) && self.refs.is_removable(var_id))
                {
                    continue;
                }
                let (Some(recorded), Some(current)) =
                    (self.registry.variable(var_id), model.variable_state(var_id))
                else {
                    continue;
                };
                let change = VariableChange::between(recorded, &current);
                if !change.is_changed() {
                    continue;
                }
                changed.push(var_id);
                if change.fixed && config.treat_fixed_vars_as_params {
                    replace.extend(
                        self.refs
                            .constraints_referencing(var_id)
                            .into_iter()
                            .filter(|con_id| !new_cons.contains(con_id)),
                    );
                    if self.refs.objective_referencing(var_id).is_some() {
                        reset_objective = true;
                    }
                }
            }
            self.refresh_variables(&*model, &changed)?;
        }
        timer.stop("vars");

        // Phase 5
        timer.start("named_exprs");
        if config.update_named_expressions {
            for con_id in &found.current_cons {
                if new_cons.contains(con_id) || replace.contains(con_id) {
                    continue;
                }
                if self.store.constraint_named_exprs_changed(*con_id, &*model) {
                    replace.insert(*con_id);
                }
            }
            if self.store.objective_named_exprs_changed(&*model) {
                reset_objective = true;
            }
        }
        timer.stop("named_exprs");

        timer.start("cons");
        let replace: Vec<ConstraintId> = replace
            .into_iter()
            .filter(|con_id| {
                self.store.contains_constraint(*con_id) && model.constraint_exprs(*con_id).is_some()
            })
            .collect();
        self.drop_constraints(&replace)?;
        self.insert_constraints(model, &replace)?;
        timer.stop("cons");

        // Phase 6
        timer.start("objective");
        let recorded = self.store.objective_id();
        let live = if config.check_for_new_objective {
            get_objective(&*model, root)?
        } else {
            recorded
        };
        if config.check_for_new_objective && live != recorded {
            reset_objective = true;
        }
        if !reset_objective && config.update_objective {
            let state = live.and_then(|obj_id| model.objective_state(obj_id));
            if let Some(state) = state {
                reset_objective = matches!(
                    self.store.diff_objective(&state, &*model),
                    ChangeKind::BodyChanged | ChangeKind::BoundsChanged
                );
            }
        }
        if reset_objective {
            self.install_objective(model, live)?;
        }
        timer.stop("objective");

        // Phase 7: after the objective, which may still have used them.
        timer.start("vars");
        self.drop_variables(&found.absent_vars)?;
        self.flush_orphans()?;
        timer.stop("vars");

        debug!(
            component = "sync",
            operation = "synchronize",
            status = "success",
            replaced_constraints = replace.len(),
            objective_reset = reset_objective,
            "Applied model changes"
        );
        Ok(reset_objective)
    }

    /// Phase 1, read-only. Disabled checks leave their sets empty.
    fn discover(&self, model: &M, root: BlockId, timer: &mut HierarchicalTimer) -> Discovery {
        let config = self.config;
        let mut found = Discovery::default();

        timer.start("vars");
        if self.only_child_vars && config.check_for_new_or_removed_vars {
            let current = model.block_variables(root);
            (found.new_vars, found.absent_vars) =
                split_new_removed(&current, &self.registry.variable_ids());
        }
        timer.stop("vars");

        timer.start("params");
        if config.check_for_new_or_removed_params {
            let current = model.block_params(root);
            let (new_params, removed_params) =
                split_new_removed(&current, &self.registry.param_ids());
            let referenced = self.store.referenced_params();
            found.new_params = new_params;
            found.removed_params = removed_params
                .into_iter()
                .filter(|param_id| !referenced.contains(param_id))
                .collect();
        }
        timer.stop("params");

        timer.start("cons");
        let check = config.check_for_new_or_removed_constraints;
        if check || config.update_constraints || config.update_named_expressions {
            found.current_cons = model.block_constraints(root);
        }
        if check || config.update_constraints {
            found.current_sos = model.block_sos(root);
        }
        if check {
            (found.new_cons, found.removed_cons) =
                split_new_removed(&found.current_cons, &self.store.constraint_ids());
            (found.new_sos, found.removed_sos) =
                split_new_removed(&found.current_sos, &self.store.sos_ids());
        }
        timer.stop("cons");

        debug!(
            component = "sync",
            operation = "discover",
            status = "success",
            new_vars = found.new_vars.len(),
            absent_vars = found.absent_vars.len(),
            new_params = found.new_params.len(),
            removed_params = found.removed_params.len(),
            new_constraints = found.new_cons.len(),
            removed_constraints = found.removed_cons.len(),
            new_sos = found.new_sos.len(),
            removed_sos = found.removed_sos.len(),
            "Discovered model changes"
        );
        found
    }
}

#[cfg(test)]
mod tests {
    use super::split_new_removed;

    #[test]
    fn test_split_new_removed_keeps_input_order() {
        let (new, removed) = split_new_removed(&[5, 1, 3], &[3, 4, 2]);
        assert_eq!(new, vec![5, 1]);
        assert_eq!(removed, vec![4, 2]);
    }

    #[test]
    fn test_split_new_removed_with_empty_sides() {
        let (new, removed) = split_new_removed::<u32>(&[], &[1]);
        assert!(new.is_empty());
        assert_eq!(removed, vec![1]);
        let (new, removed) = split_new_removed(&[1, 2], &[]);
        assert_eq!(new, vec![1, 2]);
        assert!(removed.is_empty());
    }
}
