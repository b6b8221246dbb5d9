use super::support::two_variable_model;
use super::*;
use crate::types::{DomainInterval, Sense};
use tether_expr::ExprSource;

#[test]
fn test_fix_and_unfix_keep_value() {
    let (mut model, x, _y, _con) = two_variable_model();
    model.fix(x, 3.0).unwrap();
    assert!(model.get_variable(x).unwrap().fixed);
    model.unfix(x).unwrap();
    let variable = model.get_variable(x).unwrap();
    assert!(!variable.fixed);
    assert_eq!(variable.value, Some(3.0));
    model.fix_at_current(x).unwrap();
    assert!(model.get_variable(x).unwrap().fixed);
    assert_eq!(model.get_variable(x).unwrap().value, Some(3.0));
}

#[test]
fn test_bound_values_allocate_new_expressions() {
    let (mut model, x, _y, _con) = two_variable_model();
    let before = model.get_variable(x).unwrap().upper;
    model.set_upper_value(x, Some(10.0)).unwrap();
    let after = model.get_variable(x).unwrap().upper;
    assert_ne!(before, after);
    assert_eq!(
        after.and_then(|id| model.numeric_constant(id)),
        Some(10.0)
    );
    model.set_lower_value(x, None).unwrap();
    assert_eq!(model.get_variable(x).unwrap().lower, None);
}

#[test]
fn test_domain_and_param_updates() {
    let (mut model, x, _y, _con) = two_variable_model();
    model.set_domain(x, DomainInterval::integers()).unwrap();
    assert!(model.get_variable(x).unwrap().domain.is_integer());

    let root = model.root();
    let p = model.add_param(root, 1.0, true).unwrap();
    let q = model.add_param(root, 1.0, false).unwrap();
    model.set_param_value(p, 5.0).unwrap();
    assert_eq!(model.get_param(p).unwrap().value, 5.0);
    assert_eq!(
        model.set_param_value(q, 5.0),
        Err(ModelError::ImmutableParam(q))
    );
}

#[test]
fn test_constraint_and_objective_repointing() {
    let (mut model, x, y, con) = two_variable_model();
    let root = model.root();
    let old_body = model.get_constraint(con).unwrap().body;
    let new_body = model.exprs_mut().linear(vec![(x, 1.0), (y, 2.0)], 0.0);
    model.set_body(con, new_body).unwrap();
    assert_ne!(model.get_constraint(con).unwrap().body, old_body);

    let expr = model.exprs_mut().var(x);
    let obj = model.add_objective(root, expr, Sense::Minimize).unwrap();
    model.set_objective_sense(obj, Sense::Maximize).unwrap();
    assert_eq!(model.get_objective(obj).unwrap().sense, Sense::Maximize);
    assert_eq!(
        model.set_objective_expr(obj, ExprId::new(999)),
        Err(ModelError::InvalidExpr(ExprId::new(999)))
    );
}

#[test]
fn test_named_expression_redefinition() {
    let (mut model, x, y, _con) = two_variable_model();
    let root = model.root();
    let first = model.exprs_mut().var(x);
    let named = model.add_named_expr(root, first).unwrap();
    let second = model.exprs_mut().var(y);
    model.set_named_expr(named, second).unwrap();
    assert_eq!(model.get_named_expr(named).unwrap().expr, second);
    assert_eq!(
        model.set_named_expr(NamedExprId::new(5), second),
        Err(ModelError::InvalidNamedExprId(NamedExprId::new(5)))
    );
}
