//! Snapshots of constraints, SOS constraints and the objective.
//!
//! A snapshot keeps the expression handles a referrer had when it was added
//! so later passes can tell, by handle identity, whether it changed.

use std::collections::{BTreeMap, BTreeSet};
use tether_expr::ids::{
    ConstraintId, ExprId, NamedExprId, ObjectiveId, ParamId, SosId, VariableId,
};
use tether_expr::ExprSource;

use crate::error::{EntityKind, SyncError};
use crate::source::{ConstraintExprs, ObjectiveState, SosState};

/// How a referrer differs from its snapshot.
///
/// Anything but `Unchanged` means the referrer is removed from the backend
/// and added again; nothing is patched in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Unchanged,
    /// Body (or objective expression, or objective identity) changed.
    BodyChanged,
    /// A bound changed, or the objective sense did.
    BoundsChanged,
    /// A referenced named expression was redefined.
    NamedExprChanged,
}

impl ChangeKind {
    pub fn is_changed(self) -> bool {
        self != ChangeKind::Unchanged
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Unchanged => "unchanged",
            ChangeKind::BodyChanged => "body_changed",
            ChangeKind::BoundsChanged => "bounds_changed",
            ChangeKind::NamedExprChanged => "named_expr_changed",
        }
    }
}

/// Named expressions and the inner expression each pointed at.
pub type NamedSnapshot = Vec<(NamedExprId, Option<ExprId>)>;

pub fn snapshot_named<S: ExprSource + ?Sized>(
    source: &S,
    named_exprs: &[NamedExprId],
) -> NamedSnapshot {
    named_exprs
        .iter()
        .map(|id| (*id, source.named_expr(*id)))
        .collect()
}

/// Whether any named expression now points somewhere else.
pub fn named_exprs_changed<S: ExprSource + ?Sized>(source: &S, snapshot: &NamedSnapshot) -> bool {
    snapshot
        .iter()
        .any(|(id, recorded)| source.named_expr(*id) != *recorded)
}

/// Same handle, or two constant leaves holding the same number.
pub fn bound_unchanged<S: ExprSource + ?Sized>(
    source: &S,
    recorded: Option<ExprId>,
    current: Option<ExprId>,
) -> bool {
    match (recorded, current) {
        (None, None) => true,
        (Some(recorded), Some(current)) if recorded == current => true,
        (Some(recorded), Some(current)) => {
            match (
                source.numeric_constant(recorded),
                source.numeric_constant(current),
            ) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintRecord {
    pub exprs: ConstraintExprs,
    pub variables: Vec<VariableId>,
    /// Parameters in the body or either bound.
    pub params: Vec<ParamId>,
    pub named_exprs: NamedSnapshot,
    /// External call nodes found in the body.
    pub external_functions: Vec<ExprId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SosRecord {
    pub state: SosState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveRecord {
    pub id: ObjectiveId,
    pub state: ObjectiveState,
    pub variables: Vec<VariableId>,
    pub params: Vec<ParamId>,
    pub named_exprs: NamedSnapshot,
    pub external_functions: Vec<ExprId>,
}

#[derive(Debug, Clone, Default)]
pub struct ConstraintStore {
    constraints: BTreeMap<ConstraintId, ConstraintRecord>,
    sos: BTreeMap<SosId, SosRecord>,
    objective: Option<ObjectiveRecord>,
}

impl ConstraintStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_constraint(
        &mut self,
        id: ConstraintId,
        record: ConstraintRecord,
    ) -> Result<(), SyncError> {
        if self.constraints.contains_key(&id) {
            return Err(SyncError::duplicate(EntityKind::Constraint, id.inner()));
        }
        self.constraints.insert(id, record);
        Ok(())
    }

    pub fn take_constraint(&mut self, id: ConstraintId) -> Result<ConstraintRecord, SyncError> {
        self.constraints
            .remove(&id)
            .ok_or_else(|| SyncError::unknown(EntityKind::Constraint, id.inner()))
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&ConstraintRecord> {
        self.constraints.get(&id)
    }

    pub fn contains_constraint(&self, id: ConstraintId) -> bool {
        self.constraints.contains_key(&id)
    }

    pub fn constraint_ids(&self) -> Vec<ConstraintId> {
        self.constraints.keys().copied().collect()
    }

    pub fn record_sos(&mut self, id: SosId, record: SosRecord) -> Result<(), SyncError> {
        if self.sos.contains_key(&id) {
            return Err(SyncError::duplicate(EntityKind::Sos, id.inner()));
        }
        self.sos.insert(id, record);
        Ok(())
    }

    pub fn take_sos(&mut self, id: SosId) -> Result<SosRecord, SyncError> {
        self.sos
            .remove(&id)
            .ok_or_else(|| SyncError::unknown(EntityKind::Sos, id.inner()))
    }

    pub fn contains_sos(&self, id: SosId) -> bool {
        self.sos.contains_key(&id)
    }

    pub fn sos_ids(&self) -> Vec<SosId> {
        self.sos.keys().copied().collect()
    }

    /// Install the objective snapshot, returning the one it replaces.
    pub fn record_objective(&mut self, record: ObjectiveRecord) -> Option<ObjectiveRecord> {
        self.objective.replace(record)
    }

    pub fn take_objective(&mut self) -> Option<ObjectiveRecord> {
        self.objective.take()
    }

    pub fn objective(&self) -> Option<&ObjectiveRecord> {
        self.objective.as_ref()
    }

    pub fn objective_id(&self) -> Option<ObjectiveId> {
        self.objective.as_ref().map(|record| record.id)
    }

    /// Compare a tracked constraint with its live handles.
    ///
    /// Body identity is checked first, then bounds, then named expressions.
    pub fn diff_constraint<S: ExprSource + ?Sized>(
        &self,
        id: ConstraintId,
        current: &ConstraintExprs,
        source: &S,
    ) -> Result<ChangeKind, SyncError> {
        let record = self
            .constraints
            .get(&id)
            .ok_or_else(|| SyncError::unknown(EntityKind::Constraint, id.inner()))?;
        if record.exprs.body != current.body {
            return Ok(ChangeKind::BodyChanged);
        }
        if !bound_unchanged(source, record.exprs.lower, current.lower)
            || !bound_unchanged(source, record.exprs.upper, current.upper)
        {
            return Ok(ChangeKind::BoundsChanged);
        }
        if named_exprs_changed(source, &record.named_exprs) {
            return Ok(ChangeKind::NamedExprChanged);
        }
        Ok(ChangeKind::Unchanged)
    }

    /// Whether a tracked constraint references a redefined named expression.
    pub fn constraint_named_exprs_changed<S: ExprSource + ?Sized>(
        &self,
        id: ConstraintId,
        source: &S,
    ) -> bool {
        self.constraints
            .get(&id)
            .is_some_and(|record| named_exprs_changed(source, &record.named_exprs))
    }

    /// Level, members or weights differ from the snapshot.
    pub fn diff_sos(&self, id: SosId, current: &SosState) -> Result<ChangeKind, SyncError> {
        let record = self
            .sos
            .get(&id)
            .ok_or_else(|| SyncError::unknown(EntityKind::Sos, id.inner()))?;
        if record.state == *current {
            Ok(ChangeKind::Unchanged)
        } else {
            Ok(ChangeKind::BodyChanged)
        }
    }

    /// Compare the recorded objective with the live state of the same
    /// objective. Without a recorded objective everything is new.
    pub fn diff_objective<S: ExprSource + ?Sized>(
        &self,
        current: &ObjectiveState,
        source: &S,
    ) -> ChangeKind {
        let Some(record) = &self.objective else {
            return ChangeKind::BodyChanged;
        };
        if record.state.expr != current.expr {
            ChangeKind::BodyChanged
        } else if record.state.sense != current.sense {
            ChangeKind::BoundsChanged
        } else if named_exprs_changed(source, &record.named_exprs) {
            ChangeKind::NamedExprChanged
        } else {
            ChangeKind::Unchanged
        }
    }

    pub fn objective_named_exprs_changed<S: ExprSource + ?Sized>(&self, source: &S) -> bool {
        self.objective
            .as_ref()
            .is_some_and(|record| named_exprs_changed(source, &record.named_exprs))
    }

    /// Parameters used by any tracked constraint or the objective.
    pub fn referenced_params(&self) -> BTreeSet<ParamId> {
        self.constraints
            .values()
            .flat_map(|record| record.params.iter().copied())
            .chain(
                self.objective
                    .iter()
                    .flat_map(|record| record.params.iter().copied()),
            )
            .collect()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_sos(&self) -> usize {
        self.sos.len()
    }

    pub fn clear(&mut self) {
        self.constraints.clear();
        self.sos.clear();
        self.objective = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_model::{Model, Sense, SosLevel};

    fn record_for(model: &Model, exprs: ConstraintExprs) -> ConstraintRecord {
        let collected = tether_expr::collect_vars_and_named_exprs(model, exprs.body).unwrap();
        ConstraintRecord {
            exprs,
            variables: collected.variables,
            params: collected.params,
            named_exprs: snapshot_named(model, &collected.named_exprs),
            external_functions: collected.external_functions,
        }
    }

    #[test]
    fn test_numerically_equal_constant_bound_is_unchanged() {
        let mut model = Model::new();
        let five = model.exprs_mut().constant(5.0);
        let five_again = model.exprs_mut().constant(5.0);
        let six = model.exprs_mut().constant(6.0);
        let root = model.root();
        let x = model.add_continuous(root, None, None).unwrap();
        let var_expr = model.exprs_mut().var(x);

        assert!(bound_unchanged(&model, Some(five), Some(five_again)));
        assert!(!bound_unchanged(&model, Some(five), Some(six)));
        assert!(!bound_unchanged(&model, Some(five), None));
        assert!(bound_unchanged(&model, None, None));
        assert!(bound_unchanged(&model, Some(var_expr), Some(var_expr)));
        assert!(!bound_unchanged(&model, Some(var_expr), Some(five)));
    }

    #[test]
    fn test_rebuilt_body_is_body_changed() {
        let mut model = Model::new();
        let root = model.root();
        let x = model.add_continuous(root, None, None).unwrap();
        let body = model.exprs_mut().linear(vec![(x, 1.0)], 0.0);
        let upper = model.exprs_mut().constant(1.0);
        let exprs = ConstraintExprs {
            lower: None,
            body,
            upper: Some(upper),
        };

        let mut store = ConstraintStore::new();
        let id = ConstraintId::new(0);
        store.record_constraint(id, record_for(&model, exprs)).unwrap();
        assert_eq!(
            store.diff_constraint(id, &exprs, &model),
            Ok(ChangeKind::Unchanged)
        );

        let rebuilt = model.exprs_mut().linear(vec![(x, 1.0)], 0.0);
        let current = ConstraintExprs {
            body: rebuilt,
            ..exprs
        };
        assert_eq!(
            store.diff_constraint(id, &current, &model),
            Ok(ChangeKind::BodyChanged)
        );

        let same_upper = model.exprs_mut().constant(1.0);
        let current = ConstraintExprs {
            upper: Some(same_upper),
            ..exprs
        };
        assert_eq!(
            store.diff_constraint(id, &current, &model),
            Ok(ChangeKind::Unchanged)
        );

        let current = ConstraintExprs {
            lower: Some(same_upper),
            ..exprs
        };
        assert_eq!(
            store.diff_constraint(id, &current, &model),
            Ok(ChangeKind::BoundsChanged)
        );
    }

    #[test]
    fn test_named_redefinition_is_detected() {
        let mut model = Model::new();
        let root = model.root();
        let x = model.add_continuous(root, None, None).unwrap();
        let inner = model.exprs_mut().var(x);
        let named = model.add_named_expr(root, inner).unwrap();
        let body = model.exprs_mut().named(named);
        let exprs = ConstraintExprs {
            lower: None,
            body,
            upper: None,
        };

        let mut store = ConstraintStore::new();
        let id = ConstraintId::new(0);
        store.record_constraint(id, record_for(&model, exprs)).unwrap();
        assert!(!store.constraint_named_exprs_changed(id, &model));

        let redefined = model.exprs_mut().var(x);
        model.set_named_expr(named, redefined).unwrap();
        assert!(store.constraint_named_exprs_changed(id, &model));
        assert_eq!(
            store.diff_constraint(id, &exprs, &model),
            Ok(ChangeKind::NamedExprChanged)
        );
    }

    #[test]
    fn test_duplicate_and_unknown_records() {
        let mut store = ConstraintStore::new();
        let sos = SosRecord {
            state: SosState {
                level: SosLevel::One,
                members: vec![(VariableId::new(0), 1.0)],
            },
        };
        store.record_sos(SosId::new(0), sos.clone()).unwrap();
        assert_eq!(
            store.record_sos(SosId::new(0), sos),
            Err(SyncError::duplicate(EntityKind::Sos, 0))
        );
        assert_eq!(
            store.take_constraint(ConstraintId::new(4)),
            Err(SyncError::unknown(EntityKind::Constraint, 4))
        );
    }

    #[test]
    fn test_sos_weights_are_part_of_the_snapshot() {
        let mut store = ConstraintStore::new();
        let state = SosState {
            level: SosLevel::Two,
            members: vec![(VariableId::new(0), 1.0), (VariableId::new(1), 2.0)],
        };
        store
            .record_sos(SosId::new(0), SosRecord { state: state.clone() })
            .unwrap();
        assert_eq!(store.diff_sos(SosId::new(0), &state), Ok(ChangeKind::Unchanged));

        let reweighted = SosState {
            members: vec![(VariableId::new(0), 1.0), (VariableId::new(1), 3.0)],
            ..state.clone()
        };
        assert_eq!(
            store.diff_sos(SosId::new(0), &reweighted),
            Ok(ChangeKind::BodyChanged)
        );
        let relevelled = SosState {
            level: SosLevel::One,
            ..state
        };
        assert_eq!(
            store.diff_sos(SosId::new(0), &relevelled),
            Ok(ChangeKind::BodyChanged)
        );
    }

    #[test]
    fn test_objective_diff_order() {
        let mut model = Model::new();
        let expr = model.exprs_mut().constant(0.0);
        let other = model.exprs_mut().constant(0.0);
        let state = ObjectiveState {
            expr,
            sense: Sense::Minimize,
        };
        let mut store = ConstraintStore::new();
        assert_eq!(store.diff_objective(&state, &model), ChangeKind::BodyChanged);

        store.record_objective(ObjectiveRecord {
            id: ObjectiveId::new(0),
            state,
            variables: Vec::new(),
            params: Vec::new(),
            named_exprs: Vec::new(),
            external_functions: Vec::new(),
        });
        assert_eq!(store.diff_objective(&state, &model), ChangeKind::Unchanged);
        assert_eq!(
            store.diff_objective(
                &ObjectiveState {
                    sense: Sense::Maximize,
                    ..state
                },
                &model
            ),
            ChangeKind::BoundsChanged
        );
        assert_eq!(
            store.diff_objective(
                &ObjectiveState {
                    expr: other,
                    sense: Sense::Maximize
                },
                &model
            ),
            ChangeKind::BodyChanged
        );
        assert_eq!(store.objective_id(), Some(ObjectiveId::new(0)));
    }

    #[test]
    fn test_referenced_params_cover_constraints_and_objective() {
        let mut model = Model::new();
        let root = model.root();
        let p = model.add_param(root, 2.0, true).unwrap();
        let q = model.add_param(root, 3.0, true).unwrap();
        let body = model.exprs_mut().param(p);
        let upper = model.exprs_mut().param(q);
        let con = model
            .add_constraint(tether_model::Constraint {
                block: root,
                lower: None,
                body,
                upper: Some(upper),
                active: true,
            })
            .unwrap();

        let mut store = ConstraintStore::new();
        let exprs = ConstraintExprs {
            lower: None,
            body,
            upper: Some(upper),
        };
        store
            .record_constraint(
                con,
                ConstraintRecord {
                    params: vec![p, q],
                    ..record_for(&model, exprs)
                },
            )
            .unwrap();
        store.record_objective(ObjectiveRecord {
            id: ObjectiveId::new(0),
            state: ObjectiveState {
                expr: body,
                sense: Sense::Minimize,
            },
            variables: Vec::new(),
            params: vec![p],
            named_exprs: Vec::new(),
            external_functions: Vec::new(),
        });
        assert_eq!(store.referenced_params(), BTreeSet::from([p, q]));

        store.take_constraint(con).unwrap();
        assert_eq!(store.referenced_params(), BTreeSet::from([p]));
        store.clear();
        assert!(store.referenced_params().is_empty());
    }
}
