//! Update configuration types.

use serde::{Deserialize, Serialize};

/// Gates for each discovery and diff phase of a synchronization pass.
///
/// Every flag defaults to `true`. Turning a check off skips that phase
/// entirely for the pass; stale state persists until it is turned back on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Discover variables added to or removed from the model.
    pub check_for_new_or_removed_vars: bool,
    /// Diff bounds, fixed state, value and domain of tracked variables.
    pub update_vars: bool,
    /// Discover mutable parameters added to or removed from the model.
    pub check_for_new_or_removed_params: bool,
    /// Push parameter values to the backend.
    pub update_params: bool,
    /// Discover constraints and SOS constraints added or removed.
    pub check_for_new_or_removed_constraints: bool,
    /// Diff body and bounds of tracked constraints and SOS constraints.
    pub update_constraints: bool,
    /// Detect redefined named expressions.
    pub update_named_expressions: bool,
    /// Detect a different active objective.
    pub check_for_new_objective: bool,
    /// Detect changes to the expression or sense of the active objective.
    pub update_objective: bool,
    /// Treat fixed variables as constants instead of live variables.
    pub treat_fixed_vars_as_params: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            check_for_new_or_removed_vars: true,
            update_vars: true,
            check_for_new_or_removed_params: true,
            update_params: true,
            check_for_new_or_removed_constraints: true,
            update_constraints: true,
            update_named_expressions: true,
            check_for_new_objective: true,
            update_objective: true,
            treat_fixed_vars_as_params: true,
        }
    }
}

impl UpdateConfig {
    /// Create a configuration with every check enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration with every discovery and diff check disabled.
    ///
    /// `treat_fixed_vars_as_params` is a treatment choice, not a check, and
    /// keeps its default.
    pub fn none() -> Self {
        Self {
            check_for_new_or_removed_vars: false,
            update_vars: false,
            check_for_new_or_removed_params: false,
            update_params: false,
            check_for_new_or_removed_constraints: false,
            update_constraints: false,
            update_named_expressions: false,
            check_for_new_objective: false,
            update_objective: false,
            treat_fixed_vars_as_params: true,
        }
    }

    pub fn with_check_for_new_or_removed_vars(mut self, enabled: bool) -> Self {
        self.check_for_new_or_removed_vars = enabled;
        self
    }

    pub fn with_update_vars(mut self, enabled: bool) -> Self {
        self.update_vars = enabled;
        self
    }

    pub fn with_check_for_new_or_removed_params(mut self, enabled: bool) -> Self {
        self.check_for_new_or_removed_params = enabled;
        self
    }

    pub fn with_update_params(mut self, enabled: bool) -> Self {
        self.update_params = enabled;
        self
    }

    pub fn with_check_for_new_or_removed_constraints(mut self, enabled: bool) -> Self {
        self.check_for_new_or_removed_constraints = enabled;
        self
    }

    pub fn with_update_constraints(mut self, enabled: bool) -> Self {
        self.update_constraints = enabled;
        self
    }

    pub fn with_update_named_expressions(mut self, enabled: bool) -> Self {
        self.update_named_expressions = enabled;
        self
    }

    pub fn with_check_for_new_objective(mut self, enabled: bool) -> Self {
        self.check_for_new_objective = enabled;
        self
    }

    pub fn with_update_objective(mut self, enabled: bool) -> Self {
        self.update_objective = enabled;
        self
    }

    /// Set whether fixed variables are baked into expressions as constants.
    pub fn with_treat_fixed_vars_as_params(mut self, enabled: bool) -> Self {
        self.treat_fixed_vars_as_params = enabled;
        self
    }
}
