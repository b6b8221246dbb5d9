//! Scoped release of fixed variables while a backend reads expressions.

use tether_expr::ids::VariableId;

use crate::source::SourceModel;

/// Unfixes a set of variables and fixes them again when dropped.
///
/// Values are untouched, so the variables come back fixed at the value they
/// had. Re-fixing happens on every exit path, including an early `?` return
/// from the backend call made while the guard is alive.
pub struct UnfixGuard<'a, M: SourceModel + ?Sized> {
    model: &'a mut M,
    released: Vec<VariableId>,
}

impl<'a, M: SourceModel + ?Sized> UnfixGuard<'a, M> {
    pub fn new(model: &'a mut M, variables: Vec<VariableId>) -> Self {
        for var_id in &variables {
            model.set_fixed(*var_id, false);
        }
        Self {
            model,
            released: variables,
        }
    }

    /// Read access to the model while the variables are released.
    pub fn model(&self) -> &M {
        &*self.model
    }

    pub fn released(&self) -> &[VariableId] {
        &self.released
    }
}

impl<M: SourceModel + ?Sized> Drop for UnfixGuard<'_, M> {
    fn drop(&mut self) {
        for var_id in &self.released {
            self.model.set_fixed(*var_id, true);
        }
    }
}
