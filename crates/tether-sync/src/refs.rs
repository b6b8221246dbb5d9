//! Per-variable reference counts.
//!
//! A variable is removable only when no constraint, SOS constraint or
//! objective references it.

use std::collections::{BTreeMap, BTreeSet};
use tether_expr::ids::{ConstraintId, ObjectiveId, SosId, VariableId};

use crate::error::{EntityKind, SyncError};

/// Something that can hold a reference to a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Referrer {
    Constraint(ConstraintId),
    Sos(SosId),
    Objective(ObjectiveId),
}

/// Referrers of a single variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    pub constraints: BTreeSet<ConstraintId>,
    pub sos: BTreeSet<SosId>,
    pub objective: Option<ObjectiveId>,
}

impl References {
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty() && self.sos.is_empty() && self.objective.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceTracker {
    entries: BTreeMap<VariableId, References>,
}

impl ReferenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a variable with no references.
    pub fn track(&mut self, var_id: VariableId) {
        self.entries.entry(var_id).or_default();
    }

    /// Stop tracking a variable; fails while it is still referenced.
    pub fn untrack(&mut self, var_id: VariableId) -> Result<(), SyncError> {
        self.ensure_removable(var_id)?;
        self.entries.remove(&var_id);
        Ok(())
    }

    pub fn is_tracked(&self, var_id: VariableId) -> bool {
        self.entries.contains_key(&var_id)
    }

    /// Record that `referrer` uses `var_id`. The variable must be tracked.
    ///
    /// Only one objective exists at a time, so linking an objective replaces
    /// any previous objective reference.
    pub fn link(&mut self, var_id: VariableId, referrer: Referrer) -> Result<(), SyncError> {
        let entry = self
            .entries
            .get_mut(&var_id)
            .ok_or_else(|| SyncError::unknown(EntityKind::Variable, var_id.inner()))?;
        match referrer {
            Referrer::Constraint(id) => {
                entry.constraints.insert(id);
            }
            Referrer::Sos(id) => {
                entry.sos.insert(id);
            }
            Referrer::Objective(id) => entry.objective = Some(id),
        }
        Ok(())
    }

    /// Drop a reference; a missing link is a no-op.
    ///
    /// Returns `true` when the variable is left without any references.
    pub fn unlink(&mut self, var_id: VariableId, referrer: Referrer) -> bool {
        let Some(entry) = self.entries.get_mut(&var_id) else {
            return false;
        };
        match referrer {
            Referrer::Constraint(id) => {
                entry.constraints.remove(&id);
            }
            Referrer::Sos(id) => {
                entry.sos.remove(&id);
            }
            Referrer::Objective(id) => {
                if entry.objective == Some(id) {
                    entry.objective = None;
                }
            }
        }
        entry.is_empty()
    }

    /// Whether the variable is tracked and has no references.
    pub fn is_removable(&self, var_id: VariableId) -> bool {
        self.entries.get(&var_id).is_some_and(References::is_empty)
    }

    pub fn references(&self, var_id: VariableId) -> Option<&References> {
        self.entries.get(&var_id)
    }

    /// Constraints referencing `var_id`, empty for an untracked variable.
    pub fn constraints_referencing(&self, var_id: VariableId) -> Vec<ConstraintId> {
        self.entries
            .get(&var_id)
            .map(|entry| entry.constraints.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn objective_referencing(&self, var_id: VariableId) -> Option<ObjectiveId> {
        self.entries.get(&var_id).and_then(|entry| entry.objective)
    }

    pub(crate) fn ensure_removable(&self, var_id: VariableId) -> Result<(), SyncError> {
        let entry = self
            .entries
            .get(&var_id)
            .ok_or_else(|| SyncError::unknown(EntityKind::Variable, var_id.inner()))?;
        if entry.is_empty() {
            Ok(())
        } else {
            Err(SyncError::StillReferenced {
                variable: var_id,
                constraints: entry.constraints.len(),
                sos: entry.sos.len(),
                objective: entry.objective.is_some(),
            })
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removable_only_without_references() {
        let mut refs = ReferenceTracker::new();
        let x = VariableId::new(0);
        refs.track(x);
        assert!(refs.is_removable(x));

        refs.link(x, Referrer::Constraint(ConstraintId::new(1))).unwrap();
        refs.link(x, Referrer::Sos(SosId::new(2))).unwrap();
        assert!(!refs.is_removable(x));

        assert!(!refs.unlink(x, Referrer::Constraint(ConstraintId::new(1))));
        assert!(refs.unlink(x, Referrer::Sos(SosId::new(2))));
        assert!(refs.is_removable(x));
    }

    #[test]
    fn test_unlink_is_idempotent() {
        let mut refs = ReferenceTracker::new();
        let x = VariableId::new(0);
        refs.track(x);
        refs.link(x, Referrer::Constraint(ConstraintId::new(1))).unwrap();
        assert!(refs.unlink(x, Referrer::Constraint(ConstraintId::new(1))));
        assert!(refs.unlink(x, Referrer::Constraint(ConstraintId::new(1))));
        assert!(!refs.unlink(VariableId::new(9), Referrer::Sos(SosId::new(0))));
    }

    #[test]
    fn test_untrack_reports_outstanding_references() {
        let mut refs = ReferenceTracker::new();
        let x = VariableId::new(3);
        refs.track(x);
        refs.link(x, Referrer::Objective(ObjectiveId::new(0))).unwrap();

        assert_eq!(
            refs.untrack(x),
            Err(SyncError::StillReferenced {
                variable: x,
                constraints: 0,
                sos: 0,
                objective: true,
            })
        );
        refs.unlink(x, Referrer::Objective(ObjectiveId::new(0)));
        assert_eq!(refs.untrack(x), Ok(()));
        assert!(!refs.is_tracked(x));
    }

    #[test]
    fn test_stale_objective_unlink_keeps_current_objective() {
        let mut refs = ReferenceTracker::new();
        let x = VariableId::new(0);
        refs.track(x);
        refs.link(x, Referrer::Objective(ObjectiveId::new(1))).unwrap();
        assert!(!refs.unlink(x, Referrer::Objective(ObjectiveId::new(0))));
        assert_eq!(refs.objective_referencing(x), Some(ObjectiveId::new(1)));
    }

    #[test]
    fn test_link_requires_tracked_variable() {
        let mut refs = ReferenceTracker::new();
        let err = refs
            .link(VariableId::new(5), Referrer::Constraint(ConstraintId::new(0)))
            .unwrap_err();
        assert_eq!(err.code(), "SYNC_UNKNOWN_ENTITY");
        assert!(refs.constraints_referencing(VariableId::new(5)).is_empty());
    }
}
