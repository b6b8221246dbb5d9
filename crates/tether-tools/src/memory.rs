//! Resident memory snapshots of the current process.

use sysinfo::System;

/// Resident set size captured at one point of a pass.
#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    pub rss_bytes: u64,
    /// Label of the point the snapshot was taken at (e.g. "sync_start").
    pub label: String,
}

/// Errors produced by memory instrumentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    ProcessNotFound { pid: u32 },
}

impl MemoryError {
    pub fn code(&self) -> &'static str {
        match self {
            MemoryError::ProcessNotFound { .. } => "MEMORY_PROCESS_NOT_FOUND",
        }
    }
}

impl std::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryError::ProcessNotFound { pid } => {
                write!(f, "[{}] Failed to locate process {}", self.code(), pid)
            }
        }
    }
}

impl std::error::Error for MemoryError {}

impl MemorySnapshot {
    /// Capture the current RSS under `label`.
    pub fn capture(label: &str) -> Result<Self, MemoryError> {
        let raw_pid = std::process::id();
        let pid = sysinfo::Pid::from_u32(raw_pid);

        let mut sys = System::new();
        sys.refresh_processes_specifics(
            sysinfo::ProcessesToUpdate::Some(&[pid]),
            true,
            sysinfo::ProcessRefreshKind::nothing().with_memory(),
        );

        let process = sys
            .process(pid)
            .ok_or(MemoryError::ProcessNotFound { pid: raw_pid })?;

        Ok(MemorySnapshot {
            rss_bytes: process.memory(),
            label: label.to_string(),
        })
    }

    /// RSS growth since `earlier` (negative when memory was released).
    pub fn delta_since(&self, earlier: &Self) -> i64 {
        self.rss_bytes as i64 - earlier.rss_bytes as i64
    }

    /// Capture, or `None` when the platform cannot report RSS.
    ///
    /// Instrumentation never fails a pass; the miss is logged at debug level.
    pub fn try_capture(label: &str) -> Option<Self> {
        match Self::capture(label) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::debug!(
                    component = "tools",
                    operation = "memory_capture",
                    status = "skipped",
                    label,
                    error = %err,
                    "RSS snapshot unavailable"
                );
                None
            }
        }
    }
}
