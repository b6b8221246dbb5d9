//! Incremental synchronization of a live optimization model with a
//! persistent backend.
//!
//! # Overview
//!
//! - [`PersistentSync`]: the differential update driver
//! - [`SourceModel`]: what the driver reads from (and the one thing it
//!   mutates in) the live model
//! - [`EntityRegistry`], [`ReferenceTracker`], [`ConstraintStore`]: the
//!   bookkeeping a pass diffs against
//! - [`UnfixGuard`]: scoped release of fixed variables
//! - [`SyncReport`]: what a pass sent to the backend
//!
//! ```no_run
//! # use tether_model::Model;
//! # use tether_sync::PersistentSync;
//! # fn run<B: tether_solver::PersistentBackend<Model>>(backend: B) -> Result<(), tether_sync::SyncError> {
//! let mut model = Model::new();
//! let root = model.root();
//! let mut sync = PersistentSync::new(backend);
//! sync.set_instance(&mut model, root)?;
//! // ... mutate the model ...
//! let report = sync.synchronize(&mut model)?;
//! assert_eq!(report.counts.structural_changes(), 0);
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod error;
pub mod fixed;
pub mod refs;
pub mod registry;
pub mod report;
pub mod source;
pub mod store;

pub use driver::PersistentSync;
pub use error::{EntityKind, SyncError};
pub use fixed::UnfixGuard;
pub use refs::{ReferenceTracker, References, Referrer};
pub use registry::{EntityRegistry, VariableChange};
pub use report::{SyncCounts, SyncReport};
pub use source::{
    ConstraintExprs, ObjectiveState, SosState, SourceModel, VariableState, get_objective,
};
pub use store::{ChangeKind, ConstraintRecord, ConstraintStore, ObjectiveRecord, SosRecord};
