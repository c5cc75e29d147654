//! Translation of a [`Model`] into `good_lp`.

use super::model::{MilpError, MilpOutcome, MilpSolution, Model, Relation, Sense, VarKind};
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable, VariableDefinition,
};
use serde::{Deserialize, Serialize};

#[cfg(not(any(feature = "solver-microlp", feature = "solver-highs")))]
compile_error!("enable at least one MILP backend: `solver-microlp` or `solver-highs`");

/// MILP solver used by [`Model::solve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilpBackend {
    /// Pure-Rust branch and bound (`microlp`)
    Microlp,
    /// HiGHS (`solver-highs` feature)
    Highs,
}

impl Default for MilpBackend {
    #[cfg(feature = "solver-microlp")]
    fn default() -> Self {
        MilpBackend::Microlp
    }

    #[cfg(not(feature = "solver-microlp"))]
    fn default() -> Self {
        MilpBackend::Highs
    }
}

impl MilpBackend {
    /// Whether this backend was compiled in.
    pub fn is_available(&self) -> bool {
        match self {
            MilpBackend::Microlp => cfg!(feature = "solver-microlp"),
            MilpBackend::Highs => cfg!(feature = "solver-highs"),
        }
    }
}

pub(super) fn solve(model: &Model, backend: MilpBackend) -> Result<MilpOutcome, MilpError> {
    let mut vars = ProblemVariables::new();
    let handles: Vec<Variable> = model
        .variables()
        .iter()
        .map(|kind| vars.add(definition(kind)))
        .collect();

    let objective = expression(model.objective().terms(), 0.0, &handles);
    let unsolved = match model.sense() {
        Sense::Minimize => vars.minimise(objective),
        Sense::Maximize => vars.maximise(objective),
    };

    match backend {
        #[cfg(feature = "solver-microlp")]
        MilpBackend::Microlp => run(
            unsolved.using(good_lp::solvers::microlp::microlp),
            model,
            &handles,
        ),
        #[cfg(feature = "solver-highs")]
        MilpBackend::Highs => run(
            unsolved.using(good_lp::solvers::highs::highs),
            model,
            &handles,
        ),
        #[allow(unreachable_patterns)]
        other => Err(MilpError::BackendUnavailable(other)),
    }
}

fn run<M>(mut problem: M, model: &Model, handles: &[Variable]) -> Result<MilpOutcome, MilpError>
where
    M: SolverModel<Error = ResolutionError>,
{
    for c in model.constraints() {
        let lhs = expression(c.expr.terms(), c.expr.constant_term(), handles);
        let rhs = c.rhs;
        problem = problem.with(match c.relation {
            Relation::Le => constraint!(lhs <= rhs),
            Relation::Ge => constraint!(lhs >= rhs),
            Relation::Eq => constraint!(lhs == rhs),
        });
    }

    match problem.solve() {
        Ok(solution) => {
            let values: Vec<f64> = handles.iter().map(|v| solution.value(*v)).collect();
            let objective = model.objective().evaluate(&values);
            Ok(MilpOutcome::Solved(MilpSolution::new(values, objective)))
        }
        Err(ResolutionError::Infeasible) => Ok(MilpOutcome::Infeasible),
        Err(ResolutionError::Unbounded) => Ok(MilpOutcome::Unbounded),
        Err(e) => Err(MilpError::Solver(e.to_string())),
    }
}

fn definition(kind: &VarKind) -> VariableDefinition {
    let (def, min, max) = match *kind {
        VarKind::Binary => return variable().binary(),
        VarKind::Integer { min, max } => (variable().integer(), min, max),
        VarKind::Continuous { min, max } => (variable(), min, max),
    };
    let def = if min.is_finite() { def.min(min) } else { def };
    if max.is_finite() {
        def.max(max)
    } else {
        def
    }
}

fn expression(terms: &[(super::VarId, f64)], constant: f64, handles: &[Variable]) -> Expression {
    let mut expr = Expression::from(constant);
    for &(var, coef) in terms {
        expr += coef * handles[var.index()];
    }
    expr
}
