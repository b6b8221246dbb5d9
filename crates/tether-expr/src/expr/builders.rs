//! Builder functions for constructing expressions in an arena.

use crate::expr::arena::ExprArena;
use crate::expr::error::ExprError;
use crate::ids::{ExprId, VariableId};

/// Build a linear expression node from separate variable and coefficient lists.
///
/// Zero coefficients are dropped. Returns an error if lengths mismatch.
pub fn linear_expr(
    arena: &mut ExprArena,
    variables: &[VariableId],
    coefficients: &[f64],
    constant: f64,
) -> Result<ExprId, ExprError> {
    if variables.len() != coefficients.len() {
        return Err(ExprError::MismatchedLengths {
            variables: variables.len(),
            coefficients: coefficients.len(),
        });
    }
    let terms = variables
        .iter()
        .copied()
        .zip(coefficients.iter().copied())
        .filter(|(_, c)| *c != 0.0)
        .collect();
    Ok(arena.linear(terms, constant))
}

/// Sum of `coeff * var` products built from individual nodes.
///
/// Unlike [`linear_expr`], every term gets its own node, which is what
/// a modelling layer produces from operator overloading.
pub fn sum_of_products(arena: &mut ExprArena, terms: &[(f64, VariableId)]) -> ExprId {
    let args = terms
        .iter()
        .map(|(coeff, var_id)| {
            let coeff = arena.constant(*coeff);
            let var = arena.var(*var_id);
            arena.product(coeff, var)
        })
        .collect();
    arena.sum(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::arena::Node;

    #[test]
    fn test_linear_expr_drops_zero_coefficients() {
        let mut arena = ExprArena::new();
        let x = VariableId::new(0);
        let y = VariableId::new(1);
        let id = linear_expr(&mut arena, &[x, y], &[2.0, 0.0], 1.0).unwrap();
        assert_eq!(
            arena.get(id),
            Some(&Node::Linear {
                constant: 1.0,
                terms: vec![(x, 2.0)]
            })
        );
    }

    #[test]
    fn test_linear_expr_rejects_mismatched_lengths() {
        let mut arena = ExprArena::new();
        let err = linear_expr(&mut arena, &[VariableId::new(0)], &[], 0.0).unwrap_err();
        assert_eq!(err.code(), "EXPR_MISMATCHED_LENGTHS");
        assert!(arena.is_empty());
    }

    #[test]
    fn test_sum_of_products_builds_one_product_per_term() {
        let mut arena = ExprArena::new();
        let root = sum_of_products(
            &mut arena,
            &[(1.0, VariableId::new(0)), (3.0, VariableId::new(1))],
        );
        assert_eq!(arena.get(root).map(|node| node.children().len()), Some(2));
        // 2 * (constant, var, product) + sum
        assert_eq!(arena.len(), 7);
    }
}
