//! Model module for building mutable optimization models.
//!
//! This module provides the core [`Model`] type: a live, mutable source
//! model whose components are identified by stable handles and whose
//! expressions live in a shared [`ExprArena`].
//!
//! # Module Organization
//!
//! - [`error`]: Model error types
//! - [`blocks`]: Block tree and membership queries
//! - [`builder`]: Methods for adding components
//! - [`update`]: In-place mutation of existing components
//! - [`storage`]: Component access and enumeration from a root block

mod blocks;
mod builder;
mod error;
mod storage;
mod update;

use crate::types::{
    BlockData, Constraint, NamedExpr, Objective, Param, SosConstraint, Variable,
};
use std::collections::BTreeMap;
use tether_expr::ids::{
    BlockId, ConstraintId, ExprId, NamedExprId, ObjectiveId, ParamId, SosId, VariableId,
};
use tether_expr::{ExprArena, ExprSource, Node};

pub use error::ModelError;

/// A mutable optimization model organised as a tree of blocks.
///
/// Every component keeps its handle for its whole lifetime; removed handles
/// are never reused.
#[derive(Debug, Clone)]
pub struct Model {
    pub(crate) arena: ExprArena,
    pub(crate) blocks: Vec<BlockData>,
    pub(crate) variables: BTreeMap<VariableId, Variable>,
    pub(crate) params: BTreeMap<ParamId, Param>,
    pub(crate) constraints: BTreeMap<ConstraintId, Constraint>,
    pub(crate) sos_constraints: BTreeMap<SosId, SosConstraint>,
    pub(crate) objectives: BTreeMap<ObjectiveId, Objective>,
    pub(crate) named_exprs: BTreeMap<NamedExprId, NamedExpr>,
    pub(crate) next_variable_id: u32,
    pub(crate) next_param_id: u32,
    pub(crate) next_constraint_id: u32,
    pub(crate) next_sos_id: u32,
    pub(crate) next_objective_id: u32,
    pub(crate) next_named_expr_id: u32,
}

impl Model {
    /// Create a new empty model with a single root block.
    pub fn new() -> Self {
        Self {
            arena: ExprArena::new(),
            blocks: vec![BlockData {
                name: "model".to_string(),
                parent: None,
            }],
            variables: BTreeMap::new(),
            params: BTreeMap::new(),
            constraints: BTreeMap::new(),
            sos_constraints: BTreeMap::new(),
            objectives: BTreeMap::new(),
            named_exprs: BTreeMap::new(),
            next_variable_id: 0,
            next_param_id: 0,
            next_constraint_id: 0,
            next_sos_id: 0,
            next_objective_id: 0,
            next_named_expr_id: 0,
        }
    }

    /// The root block every other block descends from.
    pub fn root(&self) -> BlockId {
        BlockId::new(0)
    }

    /// Expression arena shared by all components.
    pub fn exprs(&self) -> &ExprArena {
        &self.arena
    }

    /// Mutable arena access for building new expressions.
    pub fn exprs_mut(&mut self) -> &mut ExprArena {
        &mut self.arena
    }

    pub(crate) fn ensure_block_exists(&self, id: BlockId) -> Result<(), ModelError> {
        if (id.inner() as usize) < self.blocks.len() {
            Ok(())
        } else {
            Err(ModelError::InvalidBlockId(id))
        }
    }

    pub(crate) fn ensure_expr_exists(&self, id: ExprId) -> Result<(), ModelError> {
        if self.arena.get(id).is_some() {
            Ok(())
        } else {
            Err(ModelError::InvalidExpr(id))
        }
    }

    pub(crate) fn ensure_optional_expr(&self, id: Option<ExprId>) -> Result<(), ModelError> {
        match id {
            Some(id) => self.ensure_expr_exists(id),
            None => Ok(()),
        }
    }

    pub(crate) fn ensure_variable_exists(&self, id: VariableId) -> Result<(), ModelError> {
        if self.variables.contains_key(&id) {
            Ok(())
        } else {
            Err(ModelError::InvalidVariableId(id))
        }
    }

    pub(crate) fn variable_mut(&mut self, id: VariableId) -> Result<&mut Variable, ModelError> {
        self.variables
            .get_mut(&id)
            .ok_or(ModelError::InvalidVariableId(id))
    }

    pub(crate) fn constraint_mut(
        &mut self,
        id: ConstraintId,
    ) -> Result<&mut Constraint, ModelError> {
        self.constraints
            .get_mut(&id)
            .ok_or(ModelError::InvalidConstraintId(id))
    }

    pub(crate) fn sos_mut(&mut self, id: SosId) -> Result<&mut SosConstraint, ModelError> {
        self.sos_constraints
            .get_mut(&id)
            .ok_or(ModelError::InvalidSosId(id))
    }

    pub(crate) fn objective_mut(&mut self, id: ObjectiveId) -> Result<&mut Objective, ModelError> {
        self.objectives
            .get_mut(&id)
            .ok_or(ModelError::InvalidObjectiveId(id))
    }

    /// Optional bound from a plain number, as a fresh constant node.
    pub(crate) fn constant_bound(&mut self, value: Option<f64>) -> Option<ExprId> {
        value.map(|value| self.arena.constant(value))
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprSource for Model {
    fn node(&self, id: ExprId) -> Option<&Node> {
        self.arena.get(id)
    }

    fn named_expr(&self, id: NamedExprId) -> Option<ExprId> {
        self.named_exprs.get(&id).map(|named| named.expr)
    }

    fn is_fixed(&self, var_id: VariableId) -> bool {
        self.variables
            .get(&var_id)
            .is_some_and(|variable| variable.fixed)
    }
}
