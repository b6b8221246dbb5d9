//! Backend trait for abstraction over different persistent solvers.

use crate::BackendError;
use tether_expr::ids::{ConstraintId, ObjectiveId, ParamId, SosId, VariableId};

/// Primitive operations a persistent backend mirrors a model with.
///
/// `M` is the source model type. Calls that install or refresh state receive
/// the live model so the backend can read whatever attributes it needs;
/// removals only need handles. A batch is never empty.
pub trait PersistentBackend<M: ?Sized> {
    fn add_variables(&mut self, model: &M, variables: &[VariableId]) -> Result<(), BackendError>;

    fn remove_variables(&mut self, variables: &[VariableId]) -> Result<(), BackendError>;

    /// Re-read bounds, fixed state, value and domain of tracked variables.
    fn update_variables(
        &mut self,
        model: &M,
        variables: &[VariableId],
    ) -> Result<(), BackendError>;

    fn add_params(&mut self, model: &M, params: &[ParamId]) -> Result<(), BackendError>;

    fn remove_params(&mut self, params: &[ParamId]) -> Result<(), BackendError>;

    /// Refresh the values of every tracked parameter.
    fn update_params(&mut self, model: &M) -> Result<(), BackendError>;

    fn add_constraints(
        &mut self,
        model: &M,
        constraints: &[ConstraintId],
    ) -> Result<(), BackendError>;

    fn remove_constraints(&mut self, constraints: &[ConstraintId]) -> Result<(), BackendError>;

    fn add_sos_constraints(&mut self, model: &M, sos: &[SosId]) -> Result<(), BackendError>;

    fn remove_sos_constraints(&mut self, sos: &[SosId]) -> Result<(), BackendError>;

    /// Install `objective`, or clear the objective when `None`.
    fn set_objective(
        &mut self,
        model: &M,
        objective: Option<ObjectiveId>,
    ) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Backend that only counts calls; the model is unit.
    #[derive(Default)]
    struct CountingBackend {
        calls: usize,
        objective: Option<ObjectiveId>,
    }

    impl PersistentBackend<()> for CountingBackend {
        fn add_variables(&mut self, _: &(), _: &[VariableId]) -> Result<(), BackendError> {
            self.calls += 1;
            Ok(())
        }

        fn remove_variables(&mut self, _: &[VariableId]) -> Result<(), BackendError> {
            self.calls += 1;
            Ok(())
        }

        fn update_variables(&mut self, _: &(), _: &[VariableId]) -> Result<(), BackendError> {
            self.calls += 1;
            Ok(())
        }

        fn add_params(&mut self, _: &(), _: &[ParamId]) -> Result<(), BackendError> {
            self.calls += 1;
            Ok(())
        }

        fn remove_params(&mut self, _: &[ParamId]) -> Result<(), BackendError> {
            self.calls += 1;
            Ok(())
        }

        fn update_params(&mut self, _: &()) -> Result<(), BackendError> {
            self.calls += 1;
            Ok(())
        }

        fn add_constraints(&mut self, _: &(), _: &[ConstraintId]) -> Result<(), BackendError> {
            self.calls += 1;
            Ok(())
        }

        fn remove_constraints(&mut self, _: &[ConstraintId]) -> Result<(), BackendError> {
            self.calls += 1;
            Ok(())
        }

        fn add_sos_constraints(&mut self, _: &(), _: &[SosId]) -> Result<(), BackendError> {
            Err(BackendError::Rejected("sos unsupported".to_string()))
        }

        fn remove_sos_constraints(&mut self, _: &[SosId]) -> Result<(), BackendError> {
            self.calls += 1;
            Ok(())
        }

        fn set_objective(
            &mut self,
            _: &(),
            objective: Option<ObjectiveId>,
        ) -> Result<(), BackendError> {
            self.calls += 1;
            self.objective = objective;
            Ok(())
        }
    }

    #[test]
    fn test_backend_is_object_safe() {
        let mut backend = CountingBackend::default();
        let dynamic: &mut dyn PersistentBackend<()> = &mut backend;
        dynamic.add_variables(&(), &[VariableId::new(0)]).unwrap();
        dynamic.set_objective(&(), Some(ObjectiveId::new(1))).unwrap();
        assert_eq!(backend.calls, 2);
        assert_eq!(backend.objective, Some(ObjectiveId::new(1)));
    }

    #[test]
    fn test_backend_errors_surface_unchanged() {
        let mut backend = CountingBackend::default();
        let err = backend
            .add_sos_constraints(&(), &[SosId::new(0)])
            .unwrap_err();
        assert_eq!(err.code(), "BACKEND_REJECTED");
        assert_eq!(backend.calls, 0);
    }
}
