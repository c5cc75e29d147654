//! Mixed-integer linear programming models
//!
//! A small solver-independent [`Model`]: variables are added one at a time,
//! constraints are linear expressions against a constant, and
//! [`Model::solve`] hands the whole model to a `good_lp` backend.
//!
//! ```text
//! let x = model.add_variable(VarKind::Binary);
//! model.add_constraint(LinearExpr::new().with_term(x, 1.0), Relation::Le, 1.0);
//! model.set_objective(Sense::Minimize, LinearExpr::new().with_term(x, 3.0));
//! match model.solve(MilpBackend::default())? { MilpOutcome::Solved(s) => .., .. }
//! ```
//!
//! Infeasibility and unboundedness are outcomes, not errors. [`MilpError`]
//! is reserved for malformed models and failures inside the solver.

mod backend;
mod model;

pub use backend::MilpBackend;
pub use model::{
    Constraint, LinearExpr, MilpError, MilpOutcome, MilpSolution, Model, Relation, Sense, VarId,
    VarKind,
};
