//! Shared backend abstractions for tether synchronization.
//!
//! This crate provides the types a persistent backend implements and the
//! knobs that gate each synchronization phase.
//!
//! # Overview
//!
//! - [`UpdateConfig`]: Which discovery and diff phases a sync pass runs
//! - [`BackendError`]: Opaque failures reported by a backend
//! - [`PersistentBackend`]: Primitive add/remove/update operations
//! - [`SolveResults`]: Termination and solution status of a solve

mod config;
mod error;
mod status;
mod traits;

pub use config::UpdateConfig;
pub use error::BackendError;
pub use status::{
    NonOptimalTermination, SolutionStatus, SolveResults, TerminationCondition,
    assert_optimal_termination, check_optimal_termination,
};
pub use traits::PersistentBackend;
