//! Instrumentation for tether synchronization passes.
//!
//! - [`HierarchicalTimer`]: nested named sections with call counts and totals
//! - [`MemorySnapshot`]: resident set size of the current process

pub mod memory;
pub mod timer;

pub use memory::{MemoryError, MemorySnapshot};
pub use timer::{HierarchicalTimer, TimerEntry};
