//! Termination and solution status types.

use serde::{Deserialize, Serialize};

/// Why a solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationCondition {
    /// Status is unknown or solver did not complete.
    Unknown,
    /// Convergence criteria satisfied (optimal within tolerances).
    ConvergenceCriteriaSatisfied,
    MaxTimeLimit,
    IterationLimit,
    ObjectiveLimit,
    MinStepLength,
    Unbounded,
    ProvenInfeasible,
    LocallyInfeasible,
    InfeasibleOrUnbounded,
    Error,
    Interrupted,
    LicensingProblem,
}

impl TerminationCondition {
    pub fn as_str(self) -> &'static str {
        match self {
            TerminationCondition::Unknown => "unknown",
            TerminationCondition::ConvergenceCriteriaSatisfied => {
                "convergence_criteria_satisfied"
            }
            TerminationCondition::MaxTimeLimit => "max_time_limit",
            TerminationCondition::IterationLimit => "iteration_limit",
            TerminationCondition::ObjectiveLimit => "objective_limit",
            TerminationCondition::MinStepLength => "min_step_length",
            TerminationCondition::Unbounded => "unbounded",
            TerminationCondition::ProvenInfeasible => "proven_infeasible",
            TerminationCondition::LocallyInfeasible => "locally_infeasible",
            TerminationCondition::InfeasibleOrUnbounded => "infeasible_or_unbounded",
            TerminationCondition::Error => "error",
            TerminationCondition::Interrupted => "interrupted",
            TerminationCondition::LicensingProblem => "licensing_problem",
        }
    }
}

impl std::fmt::Display for TerminationCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Quality of the solution a solver returned, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionStatus {
    NoSolution,
    /// A solution exists but may violate tolerances.
    Noisy,
    Feasible,
    Optimal,
}

impl SolutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SolutionStatus::NoSolution => "no_solution",
            SolutionStatus::Noisy => "noisy",
            SolutionStatus::Feasible => "feasible",
            SolutionStatus::Optimal => "optimal",
        }
    }
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a solve as reported by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResults {
    pub termination_condition: TerminationCondition,
    pub solution_status: SolutionStatus,
    pub objective_value: Option<f64>,
    pub objective_bound: Option<f64>,
}

impl SolveResults {
    pub fn new(
        termination_condition: TerminationCondition,
        solution_status: SolutionStatus,
    ) -> Self {
        Self {
            termination_condition,
            solution_status,
            objective_value: None,
            objective_bound: None,
        }
    }
}

/// Returned by [`assert_optimal_termination`] when a solve was not optimal.
#[derive(Debug, Clone, PartialEq)]
pub struct NonOptimalTermination {
    pub termination_condition: TerminationCondition,
    pub solution_status: SolutionStatus,
}

impl NonOptimalTermination {
    pub fn code(&self) -> &'static str {
        "SOLVER_NOT_OPTIMAL"
    }
}

impl std::fmt::Display for NonOptimalTermination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] Solver failed to return an optimal solution. Solution status: {}, Termination condition: {}",
            self.code(),
            self.solution_status,
            self.termination_condition
        )
    }
}

impl std::error::Error for NonOptimalTermination {}

/// Whether the solve converged and produced an optimal solution.
pub fn check_optimal_termination(results: &SolveResults) -> bool {
    results.solution_status == SolutionStatus::Optimal
        && results.termination_condition == TerminationCondition::ConvergenceCriteriaSatisfied
}

/// Like [`check_optimal_termination`], but reports both statuses on failure.
pub fn assert_optimal_termination(results: &SolveResults) -> Result<(), NonOptimalTermination> {
    if check_optimal_termination(results) {
        return Ok(());
    }
    tracing::error!(
        component = "solver",
        operation = "assert_optimal_termination",
        status = "error",
        termination_condition = results.termination_condition.as_str(),
        solution_status = results.solution_status.as_str(),
        "Solve did not terminate optimally"
    );
    Err(NonOptimalTermination {
        termination_condition: results.termination_condition,
        solution_status: results.solution_status,
    })
}
