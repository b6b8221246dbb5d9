//! Synchronization error types.

use tether_expr::ExprError;
use tether_expr::ids::{BlockId, VariableId};
use tether_solver::BackendError;

/// Kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Variable,
    Param,
    Constraint,
    Sos,
    Objective,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Variable => "variable",
            EntityKind::Param => "parameter",
            EntityKind::Constraint => "constraint",
            EntityKind::Sos => "SOS constraint",
            EntityKind::Objective => "objective",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error type for synchronization operations.
///
/// Every error aborts the current operation where it is raised. The backend
/// may already hold part of the batch; callers should rebuild rather than
/// resume.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    /// The entity is already tracked.
    DuplicateEntity { kind: EntityKind, id: u32 },
    /// The entity was never added, or is missing from the source model.
    UnknownEntity { kind: EntityKind, id: u32 },
    /// A variable still has constraint, SOS or objective references.
    StillReferenced {
        variable: VariableId,
        constraints: usize,
        sos: usize,
        objective: bool,
    },
    /// More than one active objective below a block.
    MultipleObjectives { block: BlockId, count: usize },
    /// `synchronize` was called before `set_instance`.
    NotInitialized,
    /// Failure reported by the backend, unchanged.
    Backend(BackendError),
    /// An expression references a handle the model does not know.
    Expr(ExprError),
}

impl SyncError {
    pub(crate) fn duplicate(kind: EntityKind, id: u32) -> Self {
        SyncError::DuplicateEntity { kind, id }
    }

    pub(crate) fn unknown(kind: EntityKind, id: u32) -> Self {
        SyncError::UnknownEntity { kind, id }
    }

    /// Returns a semantic error code for programmatic handling.
    ///
    /// Backend and expression errors keep the code of the wrapped error.
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::DuplicateEntity { .. } => "SYNC_DUPLICATE_ENTITY",
            SyncError::UnknownEntity { .. } => "SYNC_UNKNOWN_ENTITY",
            SyncError::StillReferenced { .. } => "SYNC_STILL_REFERENCED",
            SyncError::MultipleObjectives { .. } => "SYNC_MULTIPLE_OBJECTIVES",
            SyncError::NotInitialized => "SYNC_NOT_INITIALIZED",
            SyncError::Backend(err) => err.code(),
            SyncError::Expr(err) => err.code(),
        }
    }
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::DuplicateEntity { kind, id } => {
                write!(f, "[{}] {} {} has already been added", self.code(), kind, id)
            }
            SyncError::UnknownEntity { kind, id } => {
                write!(f, "[{}] {} {} is not tracked", self.code(), kind, id)
            }
            SyncError::StillReferenced {
                variable,
                constraints,
                sos,
                objective,
            } => write!(
                f,
                "[{}] Cannot remove variable {}: referenced by {} constraints, {} SOS constraints{}",
                self.code(),
                variable,
                constraints,
                sos,
                if *objective { " and the objective" } else { "" }
            ),
            SyncError::MultipleObjectives { block, count } => write!(
                f,
                "[{}] Block {} has {} active objectives, expected at most one",
                self.code(),
                block,
                count
            ),
            SyncError::NotInitialized => write!(
                f,
                "[{}] No model instance set; call set_instance first",
                self.code()
            ),
            SyncError::Backend(err) => write!(f, "{}", err),
            SyncError::Expr(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Backend(err) => Some(err),
            SyncError::Expr(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BackendError> for SyncError {
    fn from(err: BackendError) -> Self {
        SyncError::Backend(err)
    }
}

impl From<ExprError> for SyncError {
    fn from(err: ExprError) -> Self {
        SyncError::Expr(err)
    }
}
