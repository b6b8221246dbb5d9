//! Generated models and the mutations applied between passes.

use serde::Serialize;
use tether_expr::expr::sum_of_products;
use tether_expr::ids::{ConstraintId, ExprId, ObjectiveId, ParamId, VariableId};
use tether_model::{Model, ModelError, Sense, SosLevel};

/// Shape of a generated model.
#[derive(Debug, Clone, Copy)]
pub struct CaseShape {
    pub variables: usize,
    pub constraints: usize,
    /// Every `fixed_stride`-th variable starts fixed at zero.
    pub fixed_stride: usize,
}

impl CaseShape {
    pub fn new(variables: usize, constraint_ratio: f64) -> Self {
        let constraints = ((variables as f64 * constraint_ratio).round() as usize).max(1);
        Self {
            variables: variables.max(3),
            constraints,
            fixed_stride: 10,
        }
    }
}

/// A generated model with the handles mutations need.
#[derive(Debug)]
pub struct Generated {
    pub model: Model,
    pub variables: Vec<VariableId>,
    pub constraints: Vec<ConstraintId>,
    pub params: Vec<ParamId>,
    pub objective: ObjectiveId,
}

/// Three-term rows over consecutive variables, one SOS1 set per hundred
/// variables, a mutable parameter per thousand and a linear objective.
pub fn build_model(shape: CaseShape) -> Result<Generated, ModelError> {
    let mut model = Model::new();
    let root = model.root();

    let mut variables = Vec::with_capacity(shape.variables);
    for _ in 0..shape.variables {
        variables.push(model.add_continuous(root, Some(0.0), Some(1_000.0))?);
    }
    for var_id in variables.iter().step_by(shape.fixed_stride.max(1)) {
        model.fix(*var_id, 0.0)?;
    }

    let mut constraints = Vec::with_capacity(shape.constraints);
    for row in 0..shape.constraints {
        let body = row_body(&mut model, &variables, row, 1.0);
        constraints.push(model.add_ranged_constraint(root, None, body, Some(10_000.0))?);
    }

    for chunk in variables.chunks(100).filter(|chunk| chunk.len() >= 2) {
        let members = chunk
            .iter()
            .take(4)
            .enumerate()
            .map(|(weight, var_id)| (*var_id, weight as f64 + 1.0))
            .collect();
        model.add_sos(root, SosLevel::One, members)?;
    }

    let mut params = Vec::new();
    for _ in 0..(shape.variables / 1_000).max(1) {
        params.push(model.add_param(root, 1.0, true)?);
    }

    let terms = variables.iter().map(|var_id| (*var_id, 1.0)).collect();
    let expr = model.exprs_mut().linear(terms, 0.0);
    let objective = model.add_objective(root, expr, Sense::Minimize)?;

    Ok(Generated {
        model,
        variables,
        constraints,
        params,
        objective,
    })
}

fn row_body(model: &mut Model, variables: &[VariableId], row: usize, coeff: f64) -> ExprId {
    let n = variables.len();
    let terms = (0..3)
        .map(|offset| (variables[(row + offset) % n], coeff))
        .collect();
    model.exprs_mut().linear(terms, 0.0)
}

/// Same row as [`row_body`], with one product node per term.
fn product_row_body(
    model: &mut Model,
    variables: &[VariableId],
    row: usize,
    coeff: f64,
) -> ExprId {
    let n = variables.len();
    let terms: Vec<(f64, VariableId)> = (0..3)
        .map(|offset| (coeff, variables[(row + offset) % n]))
        .collect();
    sum_of_products(model.exprs_mut(), &terms)
}

/// What one mutation round changed in the model.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MutationSummary {
    pub bounds_changed: usize,
    pub bodies_replaced: usize,
    pub deactivated: usize,
    pub added: usize,
    pub unfixed: usize,
    pub params_changed: usize,
}

/// Touch roughly `ratio` of every entity kind, deterministically.
pub fn mutate(generated: &mut Generated, ratio: f64) -> Result<MutationSummary, ModelError> {
    let stride = mutation_stride(ratio);
    let model = &mut generated.model;
    let mut summary = MutationSummary::default();

    for var_id in generated.variables.iter().skip(1).step_by(stride) {
        model.set_upper_value(*var_id, Some(500.0))?;
        summary.bounds_changed += 1;
    }

    for (row, con_id) in generated.constraints.iter().enumerate().step_by(stride) {
        let body = row_body(model, &generated.variables, row, 2.0);
        model.set_body(*con_id, body)?;
        summary.bodies_replaced += 1;
    }

    let retired: Vec<ConstraintId> = generated
        .constraints
        .iter()
        .skip(1)
        .step_by(stride.saturating_mul(2))
        .copied()
        .collect();
    for con_id in &retired {
        model.set_constraint_active(*con_id, false)?;
        summary.deactivated += 1;
    }
    generated.constraints.retain(|con_id| !retired.contains(con_id));

    let root = model.root();
    let additions = (generated.constraints.len() / stride).max(1);
    for row in 0..additions {
        let body = product_row_body(model, &generated.variables, row * 7 + 1, 0.5);
        let con_id = model.add_ranged_constraint(root, Some(-10.0), body, None)?;
        generated.constraints.push(con_id);
        summary.added += 1;
    }

    for var_id in generated.variables.iter().step_by(stride.saturating_mul(10)) {
        if model.get_variable(*var_id)?.fixed {
            model.unfix(*var_id)?;
            summary.unfixed += 1;
        }
    }

    for param_id in &generated.params {
        model.set_param_value(*param_id, 2.0)?;
        summary.params_changed += 1;
    }

    Ok(summary)
}

fn mutation_stride(ratio: f64) -> usize {
    if ratio <= 0.0 {
        return usize::MAX;
    }
    ((1.0 / ratio).round() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_expr::Node;

    #[test]
    fn test_build_model_shape() {
        let generated = build_model(CaseShape::new(200, 0.5)).unwrap();
        let model = &generated.model;
        assert_eq!(model.num_variables(), 200);
        assert_eq!(model.num_constraints(), 100);
        assert_eq!(model.num_sos_constraints(), 2);
        assert_eq!(generated.params.len(), 1);
        assert!(model.get_variable(generated.variables[0]).unwrap().fixed);
        assert!(!model.get_variable(generated.variables[1]).unwrap().fixed);
        assert_eq!(
            model.active_objectives_in(model.root()),
            vec![generated.objective]
        );
    }

    #[test]
    fn test_mutation_touches_each_kind() {
        let mut generated = build_model(CaseShape::new(100, 0.5)).unwrap();
        let summary = mutate(&mut generated, 0.1).unwrap();

        assert_eq!(summary.bounds_changed, 10);
        assert_eq!(summary.bodies_replaced, 5);
        assert_eq!(summary.deactivated, 3);
        assert_eq!(summary.added, 4);
        assert_eq!(summary.unfixed, 1);
        assert_eq!(summary.params_changed, 1);
        assert_eq!(generated.constraints.len(), 51);
        let model = &generated.model;
        assert_eq!(model.active_constraints_in(model.root()).len(), 51);
    }

    #[test]
    fn test_added_rows_are_sums_of_products() {
        let mut generated = build_model(CaseShape::new(30, 0.2)).unwrap();
        mutate(&mut generated, 0.0).unwrap();

        let added = *generated.constraints.last().unwrap();
        let model = &generated.model;
        let body = model.get_constraint(added).unwrap().body;
        let Some(Node::Sum(args)) = model.exprs().get(body) else {
            panic!("expected a sum body");
        };
        assert_eq!(args.len(), 3);
        assert!(
            args.iter()
                .all(|arg| matches!(model.exprs().get(*arg), Some(Node::Product(_))))
        );
    }

    #[test]
    fn test_zero_ratio_only_adds_one_row() {
        let mut generated = build_model(CaseShape::new(50, 0.2)).unwrap();
        let summary = mutate(&mut generated, 0.0).unwrap();
        assert_eq!(summary.bounds_changed, 1);
        assert_eq!(summary.bodies_replaced, 1);
        assert_eq!(summary.deactivated, 1);
        assert_eq!(summary.added, 1);
    }

    #[test]
    fn test_mutation_stride() {
        assert_eq!(mutation_stride(0.1), 10);
        assert_eq!(mutation_stride(1.0), 1);
        assert_eq!(mutation_stride(3.0), 1);
        assert_eq!(mutation_stride(0.0), usize::MAX);
    }
}
