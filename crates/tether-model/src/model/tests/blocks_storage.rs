use super::support::two_variable_model;
use super::*;
use crate::types::{Sense, SosLevel};

#[test]
fn test_enumeration_descends_into_child_blocks() {
    let (mut model, x, y, con) = two_variable_model();
    let root = model.root();
    let child = model.add_block(root, "child").unwrap();
    let grandchild = model.add_block(child, "grandchild").unwrap();
    let z = model.add_continuous(grandchild, None, None).unwrap();

    assert_eq!(model.variables_in(root), vec![x, y, z]);
    assert_eq!(model.variables_in(child), vec![z]);
    assert_eq!(model.active_constraints_in(root), vec![con]);
    assert!(model.active_constraints_in(child).is_empty());
    assert!(model.is_within(grandchild, root));
    assert!(!model.is_within(root, child));
}

#[test]
fn test_inactive_components_are_not_enumerated() {
    let (mut model, x, y, con) = two_variable_model();
    let root = model.root();
    let sos = model
        .add_sos(root, SosLevel::One, vec![(x, 1.0), (y, 2.0)])
        .unwrap();
    let body = model.exprs_mut().var(x);
    let obj = model.add_objective(root, body, Sense::Minimize).unwrap();

    model.set_constraint_active(con, false).unwrap();
    model.set_sos_active(sos, false).unwrap();
    model.set_objective_active(obj, false).unwrap();

    assert!(model.active_constraints_in(root).is_empty());
    assert!(model.active_sos_in(root).is_empty());
    assert!(model.active_objectives_in(root).is_empty());
    assert_eq!(model.num_constraints(), 1);
}

#[test]
fn test_only_mutable_params_are_enumerated() {
    let mut model = Model::new();
    let root = model.root();
    let mutable = model.add_param(root, 1.0, true).unwrap();
    let _fixed = model.add_param(root, 2.0, false).unwrap();
    assert_eq!(model.mutable_params_in(root), vec![mutable]);
}

#[test]
fn test_add_rejects_unknown_handles() {
    let mut model = Model::new();
    let root = model.root();
    assert_eq!(
        model.add_block(BlockId::new(9), "orphan"),
        Err(ModelError::InvalidBlockId(BlockId::new(9)))
    );
    assert_eq!(
        model.add_ranged_constraint(root, None, ExprId::new(3), None),
        Err(ModelError::InvalidExpr(ExprId::new(3)))
    );
    assert_eq!(
        model.add_sos(root, SosLevel::Two, Vec::new()),
        Err(ModelError::EmptySos)
    );
    assert_eq!(
        model.add_sos(root, SosLevel::Two, vec![(VariableId::new(4), 1.0)]),
        Err(ModelError::InvalidVariableId(VariableId::new(4)))
    );
}

#[test]
fn test_removed_handles_are_not_reused() {
    let (mut model, x, _y, con) = two_variable_model();
    let root = model.root();
    model.remove_constraint(con).unwrap();
    model.remove_variable(x).unwrap();
    let x2 = model.add_continuous(root, None, None).unwrap();
    assert_ne!(x, x2);
    assert_eq!(
        model.get_constraint(con),
        Err(ModelError::InvalidConstraintId(con))
    );
}
