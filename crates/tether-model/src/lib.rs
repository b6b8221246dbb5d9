//! Tether source model: blocks, variables, parameters, constraints and objectives.

pub mod model;
pub mod types;

pub use model::{Model, ModelError};
pub use types::{
    BlockData, Constraint, DomainInterval, NamedExpr, Objective, Param, Sense, SosConstraint,
    SosLevel, Variable,
};
