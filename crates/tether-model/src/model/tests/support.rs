use crate::model::Model;
use tether_expr::ids::{ConstraintId, VariableId};

/// Model with `x, y` in the root block and `x + 2y <= 10`.
pub(super) fn two_variable_model() -> (Model, VariableId, VariableId, ConstraintId) {
    let mut model = Model::new();
    let root = model.root();
    let x = model.add_continuous(root, Some(0.0), Some(10.0)).unwrap();
    let y = model.add_continuous(root, Some(0.0), None).unwrap();
    let body = model.exprs_mut().linear(vec![(x, 1.0), (y, 2.0)], 0.0);
    let con = model
        .add_ranged_constraint(root, None, body, Some(10.0))
        .unwrap();
    (model, x, y, con)
}
