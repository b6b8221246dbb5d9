//! Nested section timer.
//!
//! Sections are identified by their dotted path from the outermost open
//! section, e.g. `sync.vars`. Repeated runs of a section accumulate.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Accumulated timing for one section path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerEntry {
    pub path: String,
    pub calls: u64,
    pub total_ms: f64,
}

#[derive(Debug, Clone, Default)]
struct Totals {
    calls: u64,
    total: Duration,
}

#[derive(Debug, Default)]
pub struct HierarchicalTimer {
    open: Vec<(String, Instant)>,
    totals: BTreeMap<String, Totals>,
}

impl HierarchicalTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a section nested inside the currently open one.
    pub fn start(&mut self, name: &str) {
        let path = match self.open.last() {
            Some((parent, _)) => format!("{parent}.{name}"),
            None => name.to_string(),
        };
        self.open.push((path, Instant::now()));
    }

    /// Close the innermost section, which must be `name`.
    ///
    /// A mismatched or unbalanced stop is logged and ignored.
    pub fn stop(&mut self, name: &str) {
        let matches = self
            .open
            .last()
            .is_some_and(|(path, _)| path.rsplit('.').next() == Some(name));
        if !matches {
            tracing::warn!(
                component = "tools",
                operation = "timer_stop",
                status = "error",
                section = name,
                open = self.open.len(),
                "Stopped a timer section that is not the innermost open one"
            );
            return;
        }
        if let Some((path, started)) = self.open.pop() {
            let totals = self.totals.entry(path).or_default();
            totals.calls += 1;
            totals.total += started.elapsed();
        }
    }

    /// Drop every open section without recording it.
    ///
    /// Used after a pass aborted between a start and its stop.
    pub fn abandon_open(&mut self) {
        self.open.clear();
    }

    pub fn is_idle(&self) -> bool {
        self.open.is_empty()
    }

    /// Total time recorded under `path`.
    pub fn total(&self, path: &str) -> Option<Duration> {
        self.totals.get(path).map(|totals| totals.total)
    }

    pub fn calls(&self, path: &str) -> u64 {
        self.totals.get(path).map_or(0, |totals| totals.calls)
    }

    /// All recorded sections in path order.
    pub fn entries(&self) -> Vec<TimerEntry> {
        self.totals
            .iter()
            .map(|(path, totals)| TimerEntry {
                path: path.clone(),
                calls: totals.calls,
                total_ms: totals.total.as_secs_f64() * 1000.0,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.open.clear();
        self.totals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_sections_use_dotted_paths() {
        let mut timer = HierarchicalTimer::new();
        timer.start("sync");
        timer.start("vars");
        timer.stop("vars");
        timer.start("cons");
        timer.stop("cons");
        timer.stop("sync");

        let paths: Vec<String> = timer.entries().into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["sync", "sync.cons", "sync.vars"]);
        assert!(timer.is_idle());
    }

    #[test]
    fn test_repeated_sections_accumulate_calls() {
        let mut timer = HierarchicalTimer::new();
        for _ in 0..3 {
            timer.start("objective");
            timer.stop("objective");
        }
        assert_eq!(timer.calls("objective"), 3);
        assert!(timer.total("objective").is_some());
        assert_eq!(timer.calls("missing"), 0);
    }

    #[test]
    fn test_mismatched_stop_is_ignored() {
        let mut timer = HierarchicalTimer::new();
        timer.start("outer");
        timer.stop("inner");
        assert!(!timer.is_idle());
        timer.stop("outer");
        assert_eq!(timer.calls("outer"), 1);
        assert_eq!(timer.calls("outer.inner"), 0);
    }

    #[test]
    fn test_abandon_open_discards_unfinished_sections() {
        let mut timer = HierarchicalTimer::new();
        timer.start("sync");
        timer.start("cons");
        timer.abandon_open();
        assert!(timer.is_idle());
        assert!(timer.entries().is_empty());
    }

    #[test]
    fn test_entries_serialize_to_json() {
        let mut timer = HierarchicalTimer::new();
        timer.start("params");
        timer.stop("params");
        let json = serde_json::to_string(&timer.entries()).unwrap();
        assert!(json.contains("\"path\":\"params\""));
        assert!(json.contains("\"calls\":1"));
    }
}
