use super::backend::{self, MilpBackend};
use geoscope_core::GeoscopeError;
use serde::Serialize;
use thiserror::Error;

/// Handle to a variable of one [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VarId(usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Domain of a decision variable. Infinite bounds mean unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum VarKind {
    Binary,
    Integer { min: f64, max: f64 },
    Continuous { min: f64, max: f64 },
}

impl VarKind {
    /// Non-negative continuous variable
    pub fn non_negative() -> Self {
        VarKind::Continuous {
            min: 0.0,
            max: f64::INFINITY,
        }
    }

    fn bounds(&self) -> (f64, f64) {
        match *self {
            VarKind::Binary => (0.0, 1.0),
            VarKind::Integer { min, max } | VarKind::Continuous { min, max } => (min, max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Relation {
    Le,
    Ge,
    Eq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

/// `Σ coef · var + constant`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Sum of `vars`, each with coefficient one.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        self.terms.push((var, coef));
    }

    pub fn with_term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value of the expression at `values`, indexed by variable.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|(v, coef)| coef * values[v.0])
                .sum::<f64>()
    }
}

/// `expr (<=|>=|==) rhs`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    pub expr: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
}

impl Constraint {
    /// Whether `values` satisfy the constraint within `tol`.
    pub fn is_satisfied(&self, values: &[f64], tol: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.relation {
            Relation::Le => lhs <= self.rhs + tol,
            Relation::Ge => lhs >= self.rhs - tol,
            Relation::Eq => (lhs - self.rhs).abs() <= tol,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MilpError {
    #[error("variable {index} does not belong to this model")]
    UnknownVariable { index: usize },

    #[error("variable {index} has invalid bounds [{min}, {max}]")]
    InvalidBounds { index: usize, min: f64, max: f64 },

    #[error("coefficient of variable {index} is not finite")]
    NonFiniteCoefficient { index: usize },

    #[error("solver backend {0:?} was not compiled in")]
    BackendUnavailable(MilpBackend),

    #[error("solver failure: {0}")]
    Solver(String),
}

impl From<MilpError> for GeoscopeError {
    fn from(err: MilpError) -> Self {
        match err {
            MilpError::Solver(msg) => GeoscopeError::Solver(msg),
            other => GeoscopeError::Validation(other.to_string()),
        }
    }
}

/// Variable values at an optimum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilpSolution {
    values: Vec<f64>,
    objective: f64,
}

impl MilpSolution {
    pub(crate) fn new(values: Vec<f64>, objective: f64) -> Self {
        Self { values, objective }
    }

    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.0]
    }

    /// Whether a 0/1 variable is set, reading anything above one half as one.
    pub fn is_set(&self, var: VarId) -> bool {
        self.values[var.0] > 0.5
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MilpOutcome {
    Solved(MilpSolution),
    Infeasible,
    Unbounded,
}

impl MilpOutcome {
    pub fn solution(&self) -> Option<&MilpSolution> {
        match self {
            MilpOutcome::Solved(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, MilpOutcome::Infeasible)
    }
}

/// A linear program with optional integrality.
#[derive(Debug, Clone, Default)]
pub struct Model {
    variables: Vec<VarKind>,
    constraints: Vec<Constraint>,
    sense: Sense,
    objective: LinearExpr,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, kind: VarKind) -> VarId {
        self.variables.push(kind);
        VarId(self.variables.len() - 1)
    }

    pub fn add_constraint(&mut self, expr: LinearExpr, relation: Relation, rhs: f64) {
        self.constraints.push(Constraint {
            expr,
            relation,
            rhs,
        });
    }

    pub fn set_objective(&mut self, sense: Sense, objective: LinearExpr) {
        self.sense = sense;
        self.objective = objective;
    }

    pub fn variables(&self) -> &[VarKind] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Solve with `backend`.
    ///
    /// A model without variables is decided here: it is solved (objective
    /// equal to the constant) unless one of its constant constraints fails.
    pub fn solve(&self, backend: MilpBackend) -> Result<MilpOutcome, MilpError> {
        self.validate()?;

        if self.variables.is_empty() {
            let feasible = self
                .constraints
                .iter()
                .all(|c| c.is_satisfied(&[], 1e-9));
            return Ok(if feasible {
                MilpOutcome::Solved(MilpSolution::new(
                    Vec::new(),
                    self.objective.constant_term(),
                ))
            } else {
                MilpOutcome::Infeasible
            });
        }

        tracing::trace!(
            variables = self.variables.len(),
            constraints = self.constraints.len(),
            ?backend,
            "solving MILP"
        );
        backend::solve(self, backend)
    }

    fn validate(&self) -> Result<(), MilpError> {
        for (index, kind) in self.variables.iter().enumerate() {
            let (min, max) = kind.bounds();
            if min.is_nan() || max.is_nan() || min > max {
                return Err(MilpError::InvalidBounds { index, min, max });
            }
        }

        let exprs = self
            .constraints
            .iter()
            .map(|c| &c.expr)
            .chain(std::iter::once(&self.objective));
        for expr in exprs {
            for &(var, coef) in expr.terms() {
                if var.0 >= self.variables.len() {
                    return Err(MilpError::UnknownVariable { index: var.0 });
                }
                if !coef.is_finite() {
                    return Err(MilpError::NonFiniteCoefficient { index: var.0 });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_model_is_solved_without_backend() {
        let mut model = Model::new();
        model.set_objective(Sense::Minimize, LinearExpr::constant(4.0));
        let outcome = model.solve(MilpBackend::default()).unwrap();
        assert_eq!(outcome.solution().unwrap().objective(), 4.0);

        model.add_constraint(LinearExpr::constant(1.0), Relation::Le, 0.0);
        assert!(model.solve(MilpBackend::default()).unwrap().is_infeasible());
    }

    #[test]
    fn small_knapsack() {
        // max 5a + 4b + 3c  s.t.  2a + 3b + c <= 5
        let mut model = Model::new();
        let a = model.add_variable(VarKind::Binary);
        let b = model.add_variable(VarKind::Binary);
        let c = model.add_variable(VarKind::Binary);
        model.add_constraint(
            LinearExpr::new()
                .with_term(a, 2.0)
                .with_term(b, 3.0)
                .with_term(c, 1.0),
            Relation::Le,
            5.0,
        );
        model.set_objective(
            Sense::Maximize,
            LinearExpr::new()
                .with_term(a, 5.0)
                .with_term(b, 4.0)
                .with_term(c, 3.0),
        );

        let outcome = model.solve(MilpBackend::default()).unwrap();
        let solution = outcome.solution().unwrap();
        assert!((solution.objective() - 9.0).abs() < 1e-6);
        assert!(solution.is_set(a));
        assert!(solution.is_set(b));
        assert!(!solution.is_set(c));
    }

    #[test]
    fn integer_bounds_are_respected() {
        let mut model = Model::new();
        let n = model.add_variable(VarKind::Integer { min: 0.0, max: 10.0 });
        model.add_constraint(LinearExpr::new().with_term(n, 2.0), Relation::Ge, 7.0);
        model.set_objective(Sense::Minimize, LinearExpr::new().with_term(n, 1.0));

        let outcome = model.solve(MilpBackend::default()).unwrap();
        assert!((outcome.solution().unwrap().value(n) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn infeasible_is_an_outcome() {
        let mut model = Model::new();
        let x = model.add_variable(VarKind::Binary);
        model.add_constraint(LinearExpr::sum([x]), Relation::Eq, 2.0);
        model.set_objective(Sense::Minimize, LinearExpr::sum([x]));

        assert_eq!(
            model.solve(MilpBackend::default()).unwrap(),
            MilpOutcome::Infeasible
        );
    }

    #[test]
    fn foreign_variable_is_rejected() {
        let mut other = Model::new();
        other.add_variable(VarKind::Binary);
        let stranger = other.add_variable(VarKind::Binary);

        let mut model = Model::new();
        model.add_variable(VarKind::Binary);
        model.set_objective(Sense::Minimize, LinearExpr::sum([stranger]));
        assert_eq!(
            model.solve(MilpBackend::default()).unwrap_err(),
            MilpError::UnknownVariable { index: 1 }
        );
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut model = Model::new();
        model.add_variable(VarKind::Continuous { min: 3.0, max: 1.0 });
        assert!(matches!(
            model.solve(MilpBackend::default()),
            Err(MilpError::InvalidBounds { index: 0, .. })
        ));
    }
}
