//! Expression types for optimization modeling.
//!
//! - `arena`: ExprArena, append-only node table (identity = ExprId)
//! - `builders`: helpers for common node shapes
//! - `error`: expression construction and traversal errors

pub mod arena;
pub mod builders;
pub mod error;

pub use arena::{ExprArena, Node};
pub use builders::{linear_expr, sum_of_products};
pub use error::ExprError;
