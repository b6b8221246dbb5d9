//! Differential update driver.
//!
//! [`PersistentSync`] keeps a [`PersistentBackend`] consistent with a live
//! [`SourceModel`]. It owns the entity registry, the reference tracker and
//! the constraint store, and is the only thing that calls the backend.
//!
//! # Module Organization
//!
//! - [`ops`]: Validated add/remove/update primitives shared by every entry point
//! - [`phases`]: The multi-phase `synchronize` pass

mod ops;
mod phases;

use std::collections::BTreeSet;
use std::marker::PhantomData;
use tether_expr::ids::{BlockId, ConstraintId, ObjectiveId, ParamId, SosId, VariableId};
use tether_solver::{PersistentBackend, UpdateConfig};
use tracing::{error, info};

use crate::error::{EntityKind, SyncError};
use crate::refs::ReferenceTracker;
use crate::registry::EntityRegistry;
use crate::report::SyncCounts;
use crate::source::{SourceModel, get_objective};
use crate::store::ConstraintStore;

/// Incremental mirror of a model in a persistent backend.
///
/// By default variables are tracked by reference: a variable is added the
/// first time a constraint, SOS constraint or the objective uses it, and
/// removed once nothing does. With `only_child_vars` variables are tracked
/// by block membership instead and are never added or removed implicitly.
pub struct PersistentSync<M: ?Sized, B> {
    backend: B,
    config: UpdateConfig,
    only_child_vars: bool,
    root: Option<BlockId>,
    registry: EntityRegistry,
    refs: ReferenceTracker,
    store: ConstraintStore,
    /// Variables whose last reference was dropped, removed at the next flush.
    orphans: BTreeSet<VariableId>,
    counts: SyncCounts,
    _model: PhantomData<fn(&M)>,
}

impl<M: ?Sized, B> PersistentSync<M, B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: UpdateConfig::default(),
            only_child_vars: false,
            root: None,
            registry: EntityRegistry::new(),
            refs: ReferenceTracker::new(),
            store: ConstraintStore::new(),
            orphans: BTreeSet::new(),
            counts: SyncCounts::default(),
            _model: PhantomData,
        }
    }

    pub fn with_config(mut self, config: UpdateConfig) -> Self {
        self.config = config;
        self
    }

    /// Track variables by block membership instead of by reference.
    pub fn with_only_child_vars(mut self, enabled: bool) -> Self {
        self.only_child_vars = enabled;
        self
    }

    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: UpdateConfig) {
        self.config = config;
    }

    pub fn only_child_vars(&self) -> bool {
        self.only_child_vars
    }

    /// Root block of the current instance.
    pub fn root(&self) -> Option<BlockId> {
        self.root
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn references(&self) -> &ReferenceTracker {
        &self.refs
    }

    pub fn store(&self) -> &ConstraintStore {
        &self.store
    }

    /// Backend work done since the last `synchronize` started.
    pub fn counts(&self) -> &SyncCounts {
        &self.counts
    }

    /// Whether `var_id` is tracked and nothing references it any more.
    pub fn is_removable(&self, var_id: VariableId) -> bool {
        self.refs.is_removable(var_id)
    }

    fn reset(&mut self) {
        self.root = None;
        self.registry.clear();
        self.refs.clear();
        self.store.clear();
        self.orphans.clear();
        self.counts = SyncCounts::default();
    }
}

fn log_failure(operation: &'static str, err: &SyncError) {
    error!(
        component = "sync",
        operation,
        status = "error",
        code = err.code(),
        error = %err,
        "Synchronization operation failed"
    );
}

/// Reject a batch that names the same entity twice.
fn distinct<T: Ord + Copy>(
    items: &[T],
    kind: EntityKind,
    raw: impl Fn(T) -> u32,
) -> Result<Vec<T>, SyncError> {
    let mut seen = BTreeSet::new();
    for item in items {
        if !seen.insert(*item) {
            return Err(SyncError::duplicate(kind, raw(*item)));
        }
    }
    Ok(items.to_vec())
}

impl<M, B> PersistentSync<M, B>
where
    M: SourceModel + ?Sized,
    B: PersistentBackend<M>,
{
    /// Forget all state and mirror everything below `root`.
    ///
    /// The configuration survives the reset. When `root` has no active
    /// objective the backend is told so explicitly.
    pub fn set_instance(&mut self, model: &mut M, root: BlockId) -> Result<(), SyncError> {
        self.reset();
        self.root = Some(root);
        self.insert_instance(model, root)
            .inspect_err(|err| log_failure("set_instance", err))?;
        info!(
            component = "sync",
            operation = "set_instance",
            status = "success",
            root = root.inner(),
            only_child_vars = self.only_child_vars,
            variables = self.registry.num_variables(),
            params = self.registry.num_params(),
            constraints = self.store.num_constraints(),
            sos_constraints = self.store.num_sos(),
            has_objective = self.store.objective().is_some(),
            "Model instance mirrored"
        );
        Ok(())
    }

    /// Add the mutable parameters, constraints, SOS constraints and the
    /// objective of `block` (and, with `only_child_vars`, its variables).
    pub fn add_block(&mut self, model: &mut M, block: BlockId) -> Result<(), SyncError> {
        self.insert_block(model, block)
            .inspect_err(|err| log_failure("add_block", err))
    }

    /// Remove what [`add_block`](Self::add_block) added for `block`.
    pub fn remove_block(&mut self, model: &M, block: BlockId) -> Result<(), SyncError> {
        self.drop_block(model, block)
            .inspect_err(|err| log_failure("remove_block", err))
    }

    fn insert_instance(&mut self, model: &mut M, root: BlockId) -> Result<(), SyncError> {
        self.insert_block(model, root)?;
        if self.store.objective().is_none() {
            self.install_objective(model, None)?;
        }
        Ok(())
    }

    fn insert_block(&mut self, model: &mut M, block: BlockId) -> Result<(), SyncError> {
        self.insert_params(&*model, &model.block_params(block))?;
        if self.only_child_vars {
            self.insert_variables(&*model, &model.block_variables(block))?;
        }
        let constraints = model.block_constraints(block);
        self.insert_constraints(model, &constraints)?;
        self.insert_sos(&*model, &model.block_sos(block))?;
        if let Some(objective) = get_objective(&*model, block)? {
            self.install_objective(model, Some(objective))?;
        }
        self.flush_orphans()
    }

    fn drop_block(&mut self, model: &M, block: BlockId) -> Result<(), SyncError> {
        self.drop_constraints(&model.block_constraints(block))?;
        self.drop_sos(&model.block_sos(block))?;
        if self.only_child_vars {
            self.drop_variables(&model.block_variables(block))?;
        }
        self.drop_params(&model.block_params(block))?;
        self.flush_orphans()
    }

    pub fn add_variables(&mut self, model: &M, variables: &[VariableId]) -> Result<(), SyncError> {
        self.insert_variables(model, variables)
            .inspect_err(|err| log_failure("add_variables", err))
    }

    pub fn add_params(&mut self, model: &M, params: &[ParamId]) -> Result<(), SyncError> {
        self.insert_params(model, params)
            .inspect_err(|err| log_failure("add_params", err))
    }

    /// Add constraints, registering any variable they reference first.
    ///
    /// Nothing reaches the backend unless every constraint in the batch is
    /// new, present in the model and walkable.
    pub fn add_constraints(
        &mut self,
        model: &mut M,
        constraints: &[ConstraintId],
    ) -> Result<(), SyncError> {
        self.insert_constraints(model, constraints)
            .inspect_err(|err| log_failure("add_constraints", err))
    }

    pub fn add_sos_constraints(&mut self, model: &M, sos: &[SosId]) -> Result<(), SyncError> {
        self.insert_sos(model, sos)
            .inspect_err(|err| log_failure("add_sos_constraints", err))
    }

    /// Retire the current objective and install `objective` (or none).
    pub fn set_objective(
        &mut self,
        model: &mut M,
        objective: Option<ObjectiveId>,
    ) -> Result<(), SyncError> {
        self.install_objective(model, objective)
            .and_then(|()| self.flush_orphans())
            .inspect_err(|err| log_failure("set_objective", err))
    }

    /// Remove variables; every one must be unreferenced.
    pub fn remove_variables(&mut self, variables: &[VariableId]) -> Result<(), SyncError> {
        self.drop_variables(variables)
            .inspect_err(|err| log_failure("remove_variables", err))
    }

    pub fn remove_params(&mut self, params: &[ParamId]) -> Result<(), SyncError> {
        self.drop_params(params)
            .inspect_err(|err| log_failure("remove_params", err))
    }

    /// Remove constraints, then any variable left without references.
    pub fn remove_constraints(&mut self, constraints: &[ConstraintId]) -> Result<(), SyncError> {
        self.drop_constraints(constraints)
            .and_then(|()| self.flush_orphans())
            .inspect_err(|err| log_failure("remove_constraints", err))
    }

    pub fn remove_sos_constraints(&mut self, sos: &[SosId]) -> Result<(), SyncError> {
        self.drop_sos(sos)
            .and_then(|()| self.flush_orphans())
            .inspect_err(|err| log_failure("remove_sos_constraints", err))
    }

    /// Re-snapshot tracked variables and push them to the backend.
    pub fn update_variables(
        &mut self,
        model: &M,
        variables: &[VariableId],
    ) -> Result<(), SyncError> {
        self.refresh_variables(model, variables)
            .inspect_err(|err| log_failure("update_variables", err))
    }

    /// Ask the backend to re-read every tracked parameter value.
    pub fn update_params(&mut self, model: &M) -> Result<(), SyncError> {
        self.refresh_params(model)
            .inspect_err(|err| log_failure("update_params", err))
    }
}
