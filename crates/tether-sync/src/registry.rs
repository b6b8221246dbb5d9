//! Last synchronized state of every tracked variable and parameter.

use std::collections::{BTreeMap, BTreeSet};
use tether_expr::ids::{ParamId, VariableId};

use crate::error::{EntityKind, SyncError};
use crate::refs::ReferenceTracker;
use crate::source::VariableState;

/// Which attributes of a variable differ from its recorded snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariableChange {
    /// Lower or upper bound points at a different expression.
    pub bounds: bool,
    /// Fixed flag flipped, or the value moved while the variable was fixed.
    pub fixed: bool,
    pub domain: bool,
}

impl VariableChange {
    pub fn between(recorded: &VariableState, current: &VariableState) -> Self {
        Self {
            bounds: recorded.lower != current.lower || recorded.upper != current.upper,
            fixed: recorded.fixed != current.fixed
                || (recorded.fixed && recorded.value != current.value),
            domain: recorded.domain != current.domain,
        }
    }

    pub fn is_changed(self) -> bool {
        self.bounds || self.fixed || self.domain
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    variables: BTreeMap<VariableId, VariableState>,
    params: BTreeSet<ParamId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_variable(
        &mut self,
        id: VariableId,
        state: VariableState,
    ) -> Result<(), SyncError> {
        if self.variables.contains_key(&id) {
            return Err(SyncError::duplicate(EntityKind::Variable, id.inner()));
        }
        self.variables.insert(id, state);
        Ok(())
    }

    /// Overwrite the snapshot, returning the previous one.
    pub fn update_variable(
        &mut self,
        id: VariableId,
        state: VariableState,
    ) -> Result<VariableState, SyncError> {
        let record = self
            .variables
            .get_mut(&id)
            .ok_or_else(|| SyncError::unknown(EntityKind::Variable, id.inner()))?;
        Ok(std::mem::replace(record, state))
    }

    /// Drop a variable record; `refs` must show no outstanding references.
    pub fn unregister_variable(
        &mut self,
        id: VariableId,
        refs: &mut ReferenceTracker,
    ) -> Result<VariableState, SyncError> {
        if !self.variables.contains_key(&id) {
            return Err(SyncError::unknown(EntityKind::Variable, id.inner()));
        }
        refs.untrack(id)?;
        self.variables
            .remove(&id)
            .ok_or_else(|| SyncError::unknown(EntityKind::Variable, id.inner()))
    }

    pub fn variable(&self, id: VariableId) -> Option<&VariableState> {
        self.variables.get(&id)
    }

    pub fn contains_variable(&self, id: VariableId) -> bool {
        self.variables.contains_key(&id)
    }

    pub fn variable_ids(&self) -> Vec<VariableId> {
        self.variables.keys().copied().collect()
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn register_param(&mut self, id: ParamId) -> Result<(), SyncError> {
        if !self.params.insert(id) {
            return Err(SyncError::duplicate(EntityKind::Param, id.inner()));
        }
        Ok(())
    }

    pub fn unregister_param(&mut self, id: ParamId) -> Result<(), SyncError> {
        if !self.params.remove(&id) {
            return Err(SyncError::unknown(EntityKind::Param, id.inner()));
        }
        Ok(())
    }

    pub fn contains_param(&self, id: ParamId) -> bool {
        self.params.contains(&id)
    }

    pub fn param_ids(&self) -> Vec<ParamId> {
        self.params.iter().copied().collect()
    }

    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    pub fn clear(&mut self) {
        self.variables.clear();
        self.params.clear();
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::refs::Referrer;
    use tether_expr::ids::{ConstraintId, ExprId};
    use tether_model::DomainInterval;

    fn state(fixed: bool, value: Option<f64>) -> VariableState {
        VariableState {
            lower: Some(ExprId::new(0)),
            upper: None,
            fixed,
            value,
            domain: DomainInterval::reals(),
        }
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = EntityRegistry::new();
        let x = VariableId::new(0);
        registry.register_variable(x, state(false, None)).unwrap();
        assert_eq!(
            registry.register_variable(x, state(false, None)),
            Err(SyncError::duplicate(EntityKind::Variable, 0))
        );
        registry.register_param(ParamId::new(1)).unwrap();
        assert_eq!(
            registry.register_param(ParamId::new(1)),
            Err(SyncError::duplicate(EntityKind::Param, 1))
        );
    }

    #[test]
    fn test_update_returns_previous_snapshot() {
        let mut registry = EntityRegistry::new();
        let x = VariableId::new(0);
        registry.register_variable(x, state(false, None)).unwrap();
        let previous = registry.update_variable(x, state(true, Some(2.0))).unwrap();
        assert!(!previous.fixed);
        assert_eq!(registry.variable(x).map(|s| s.value), Some(Some(2.0)));
        assert_eq!(
            registry.update_variable(VariableId::new(7), state(false, None)),
            Err(SyncError::unknown(EntityKind::Variable, 7))
        );
    }

    #[test]
    fn test_unregister_consults_references() {
        let mut registry = EntityRegistry::new();
        let mut refs = ReferenceTracker::new();
        let x = VariableId::new(0);
        registry.register_variable(x, state(false, None)).unwrap();
        refs.track(x);
        refs.link(x, Referrer::Constraint(ConstraintId::new(0))).unwrap();

        let err = registry.unregister_variable(x, &mut refs).unwrap_err();
        assert_eq!(err.code(), "SYNC_STILL_REFERENCED");
        assert!(registry.contains_variable(x));

        refs.unlink(x, Referrer::Constraint(ConstraintId::new(0)));
        registry.unregister_variable(x, &mut refs).unwrap();
        assert!(!registry.contains_variable(x));
        assert_eq!(
            registry.unregister_variable(x, &mut refs),
            Err(SyncError::unknown(EntityKind::Variable, 0))
        );
    }

    #[test]
    fn test_change_detects_value_only_while_fixed() {
        let free = VariableChange::between(&state(false, Some(1.0)), &state(false, Some(2.0)));
        assert!(!free.is_changed());

        let fixed = VariableChange::between(&state(true, Some(1.0)), &state(true, Some(2.0)));
        assert!(fixed.fixed);

        let unfixed = VariableChange::between(&state(true, Some(1.0)), &state(false, Some(1.0)));
        assert!(unfixed.fixed);
        assert!(!unfixed.bounds);
    }

    #[test]
    fn test_change_compares_bound_identity() {
        let recorded = state(false, None);
        let mut current = recorded;
        current.lower = Some(ExprId::new(5));
        assert!(VariableChange::between(&recorded, &current).bounds);

        current = recorded;
        current.domain = DomainInterval::binary();
        let change = VariableChange::between(&recorded, &current);
        assert!(change.domain);
        assert!(change.is_changed());
    }
}
