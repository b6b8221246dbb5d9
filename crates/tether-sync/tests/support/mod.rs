#![allow(dead_code)]

use tether_expr::ids::{ConstraintId, ObjectiveId, ParamId, SosId, VariableId};
use tether_model::{Model, SosLevel};
use tether_solver::{BackendError, PersistentBackend};
use tether_sync::PersistentSync;

/// One primitive call as the backend received it.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AddVariables(Vec<VariableId>),
    RemoveVariables(Vec<VariableId>),
    UpdateVariables(Vec<VariableId>),
    AddParams(Vec<ParamId>),
    RemoveParams(Vec<ParamId>),
    UpdateParams,
    AddConstraints(Vec<ConstraintId>),
    RemoveConstraints(Vec<ConstraintId>),
    AddSos(Vec<SosId>),
    RemoveSos(Vec<SosId>),
    SetObjective(Option<ObjectiveId>),
}

/// Backend that logs every call in order.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<Call>,
    /// Fixed flag of every model variable at each `add_constraints` call.
    pub fixed_at_add: Vec<Vec<(VariableId, bool)>>,
    pub fail_add_constraints: bool,
}

impl RecordingBackend {
    /// Drain the call log.
    pub fn take(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }
}

fn fixed_flags(model: &Model) -> Vec<(VariableId, bool)> {
    model
        .variables_in(model.root())
        .into_iter()
        .map(|var_id| {
            let fixed = model
                .get_variable(var_id)
                .map(|variable| variable.fixed)
                .unwrap_or(false);
            (var_id, fixed)
        })
        .collect()
}

impl PersistentBackend<Model> for RecordingBackend {
    fn add_variables(&mut self, _: &Model, variables: &[VariableId]) -> Result<(), BackendError> {
        self.calls.push(Call::AddVariables(variables.to_vec()));
        Ok(())
    }

    fn remove_variables(&mut self, variables: &[VariableId]) -> Result<(), BackendError> {
        self.calls.push(Call::RemoveVariables(variables.to_vec()));
        Ok(())
    }

    fn update_variables(
        &mut self,
        _: &Model,
        variables: &[VariableId],
    ) -> Result<(), BackendError> {
        self.calls.push(Call::UpdateVariables(variables.to_vec()));
        Ok(())
    }

    fn add_params(&mut self, _: &Model, params: &[ParamId]) -> Result<(), BackendError> {
        self.calls.push(Call::AddParams(params.to_vec()));
        Ok(())
    }

    fn remove_params(&mut self, params: &[ParamId]) -> Result<(), BackendError> {
        self.calls.push(Call::RemoveParams(params.to_vec()));
        Ok(())
    }

    fn update_params(&mut self, _: &Model) -> Result<(), BackendError> {
        self.calls.push(Call::UpdateParams);
        Ok(())
    }

    fn add_constraints(
        &mut self,
        model: &Model,
        constraints: &[ConstraintId],
    ) -> Result<(), BackendError> {
        self.fixed_at_add.push(fixed_flags(model));
        if self.fail_add_constraints {
            return Err(BackendError::Rejected("constraint refused".to_string()));
        }
        self.calls.push(Call::AddConstraints(constraints.to_vec()));
        Ok(())
    }

    fn remove_constraints(&mut self, constraints: &[ConstraintId]) -> Result<(), BackendError> {
        self.calls.push(Call::RemoveConstraints(constraints.to_vec()));
        Ok(())
    }

    fn add_sos_constraints(&mut self, _: &Model, sos: &[SosId]) -> Result<(), BackendError> {
        self.calls.push(Call::AddSos(sos.to_vec()));
        Ok(())
    }

    fn remove_sos_constraints(&mut self, sos: &[SosId]) -> Result<(), BackendError> {
        self.calls.push(Call::RemoveSos(sos.to_vec()));
        Ok(())
    }

    fn set_objective(
        &mut self,
        _: &Model,
        objective: Option<ObjectiveId>,
    ) -> Result<(), BackendError> {
        self.calls.push(Call::SetObjective(objective));
        Ok(())
    }
}

pub type SyncUnderTest = PersistentSync<Model, RecordingBackend>;

/// Handles of the base fixture.
pub struct Fixture {
    pub model: Model,
    pub x: VariableId,
    pub y: VariableId,
    pub z: VariableId,
    pub c1: ConstraintId,
    pub s1: SosId,
}

/// `c1: x + y <= 5` with `x` fixed at 1, and `s1: SOS1 {y: 1, z: 2}`.
pub fn fixture() -> Fixture {
    let mut model = Model::new();
    let root = model.root();
    let x = model.add_continuous(root, Some(0.0), Some(10.0)).unwrap();
    let y = model.add_continuous(root, Some(0.0), None).unwrap();
    let z = model.add_continuous(root, Some(0.0), Some(1.0)).unwrap();
    model.fix(x, 1.0).unwrap();

    let body = model.exprs_mut().linear(vec![(x, 1.0), (y, 1.0)], 0.0);
    let c1 = model
        .add_ranged_constraint(root, None, body, Some(5.0))
        .unwrap();
    let s1 = model
        .add_sos(root, SosLevel::One, vec![(y, 1.0), (z, 2.0)])
        .unwrap();

    Fixture {
        model,
        x,
        y,
        z,
        c1,
        s1,
    }
}

/// Mirror the fixture and clear the call log.
pub fn mirrored(fixture: &mut Fixture, sync: &mut SyncUnderTest) {
    let root = fixture.model.root();
    sync.set_instance(&mut fixture.model, root).unwrap();
    sync.backend_mut().take();
}
