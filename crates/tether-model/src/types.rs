use tether_expr::ids::{BlockId, ExprId, VariableId};

/// Optimization sense
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

impl Sense {
    pub fn as_str(self) -> &'static str {
        match self {
            Sense::Minimize => "minimize",
            Sense::Maximize => "maximize",
        }
    }
}

/// Interval shape of a variable domain.
///
/// `step == 0.0` is a continuous domain, `step == 1.0` an integer one.
/// Missing bounds are unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainInterval {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub step: f64,
}

impl DomainInterval {
    pub fn reals() -> Self {
        Self {
            lower: None,
            upper: None,
            step: 0.0,
        }
    }

    pub fn non_negative_reals() -> Self {
        Self {
            lower: Some(0.0),
            upper: None,
            step: 0.0,
        }
    }

    pub fn integers() -> Self {
        Self {
            lower: None,
            upper: None,
            step: 1.0,
        }
    }

    pub fn binary() -> Self {
        Self {
            lower: Some(0.0),
            upper: Some(1.0),
            step: 1.0,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.step != 0.0
    }
}

impl Default for DomainInterval {
    fn default() -> Self {
        Self::reals()
    }
}

/// A decision variable.
///
/// Bounds are expression handles so that a bound re-derived from a
/// parameter expression is distinguishable from the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub block: BlockId,
    pub lower: Option<ExprId>,
    pub upper: Option<ExprId>,
    pub fixed: bool,
    pub value: Option<f64>,
    pub domain: DomainInterval,
}

/// A parameter. Only mutable parameters are mirrored by persistent backends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param {
    pub block: BlockId,
    pub value: f64,
    pub mutable: bool,
}

/// `lower <= body <= upper`, any bound may be absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub block: BlockId,
    pub lower: Option<ExprId>,
    pub body: ExprId,
    pub upper: Option<ExprId>,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SosLevel {
    One,
    Two,
}

/// Special-ordered-set constraint over weighted variables.
#[derive(Debug, Clone, PartialEq)]
pub struct SosConstraint {
    pub block: BlockId,
    pub level: SosLevel,
    pub members: Vec<(VariableId, f64)>,
    pub active: bool,
}

impl SosConstraint {
    pub fn variables(&self) -> Vec<VariableId> {
        self.members.iter().map(|(var_id, _)| *var_id).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Objective {
    pub block: BlockId,
    pub expr: ExprId,
    pub sense: Sense,
    pub active: bool,
}

/// Shared named expression. Re-pointing `expr` is how a model redefines it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NamedExpr {
    pub block: BlockId,
    pub expr: ExprId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockData {
    pub name: String,
    pub parent: Option<BlockId>,
}
