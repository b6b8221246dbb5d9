//! Backend error types.

/// Failure reported by a persistent backend.
///
/// The synchronization layer propagates these unchanged and never retries.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The backend refused an operation (bad input, unsupported feature).
    Rejected(String),
    /// The backend is not reachable or not initialised.
    Unavailable(String),
    /// Internal backend failure.
    Internal(String),
}

impl BackendError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            BackendError::Rejected(_) => "BACKEND_REJECTED",
            BackendError::Unavailable(_) => "BACKEND_UNAVAILABLE",
            BackendError::Internal(_) => "BACKEND_INTERNAL",
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Rejected(msg) => {
                write!(f, "[{}] Backend rejected operation: {}", self.code(), msg)
            }
            BackendError::Unavailable(msg) => {
                write!(f, "[{}] Backend unavailable: {}", self.code(), msg)
            }
            BackendError::Internal(msg) => {
                write!(f, "[{}] Backend internal error: {}", self.code(), msg)
            }
        }
    }
}

impl std::error::Error for BackendError {}
