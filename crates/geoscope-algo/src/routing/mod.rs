//! Capacitated vehicle routing (VRP) and TSP
//!
//! Routes a fleet of identical vehicles out of a single depot so that every
//! customer is visited exactly once and the total travel cost is minimal.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  VEHICLE ROUTING PROBLEM                                                 │
//! │  ───────────────────────                                                 │
//! │                                                                          │
//! │  Given:                                                                  │
//! │    • Cost matrix over depot (node 0) and customers 1..=N                │
//! │    • Optional customer demands and a per-vehicle capacity               │
//! │                                                                          │
//! │  Decide:                                                                 │
//! │    • x_ijk = 1 iff vehicle k drives from i to j                         │
//! │                                                                          │
//! │  Search:                                                                 │
//! │    • Fleet sizes K = min, min+1, ..., max; the first feasible wins      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## MILP Formulation
//!
//! ```text
//! minimize    Σ_k Σ_{i≠j} c_ij · x_ijk
//!
//! subject to:
//!   Σ_k Σ_i x_ijk = 1                  ∀ customer j      Visited once
//!   Σ_j x_0jk = 1,  Σ_i x_i0k = 1      ∀ k               Leave and return to depot
//!   Σ_i x_ijk = Σ_l x_jlk              ∀ j, k            Flow conservation
//!   Σ_{i,j} d_j · x_ijk ≤ Q            ∀ k               Capacity
//!   Σ_{i,j ∈ S} x_ijk ≤ |S| - 1        ∀ S ⊆ customers, |S| ≥ 2, ∀ k
//!   x_ijk ∈ {0,1}
//! ```
//!
//! Arcs on the diagonal or with an infinite cost get no variable at all.
//!
//! ## Subtour elimination
//!
//! [`SubtourStrategy::Exhaustive`] writes a cut for every customer subset up
//! front, which grows as 2^N. [`SubtourStrategy::Lazy`] solves without cuts,
//! looks for cycles that miss the depot in the incumbent (strongly connected
//! components per vehicle), adds exactly those cuts and re-solves. Cuts
//! found for one fleet size are reused for the next.
//!
//! ## Known limitation
//!
//! Every fleet size is a fresh MILP. Small instances only.

mod problem;
mod solution;
mod solver;
mod subtour;

pub use problem::{VrpProblem, VrpProblemBuilder};
pub use solution::{AttemptOutcome, FleetAttempt, RouteArc, VehicleRoute, VrpSolution};
pub use solver::{solve_tsp, solve_vrp};

use crate::milp::MilpError;
use geoscope_core::GeoscopeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How subtour elimination constraints enter the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtourStrategy {
    /// Enumerate every customer subset of size 2..=N
    Exhaustive,
    /// Add cuts only for subtours found in the incumbent
    #[default]
    Lazy,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    #[error("no feasible routing with at most {max_vehicles} vehicles")]
    NoSolution { max_vehicles: usize },

    #[error("invalid routing problem: {0}")]
    InvalidProblem(String),

    #[error("{customers} customers exceed the exhaustive subtour limit of {limit}")]
    TooManyCustomers { customers: usize, limit: usize },

    #[error("subtours remain after {rounds} cut rounds with {vehicles} vehicles")]
    CutLimit { vehicles: usize, rounds: usize },

    #[error("solver failure: {0}")]
    Solver(String),
}

impl From<MilpError> for RoutingError {
    fn from(err: MilpError) -> Self {
        RoutingError::Solver(err.to_string())
    }
}

impl From<RoutingError> for GeoscopeError {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::NoSolution { .. } => GeoscopeError::NoSolution(err.to_string()),
            RoutingError::InvalidProblem(msg) => GeoscopeError::Validation(msg),
            RoutingError::TooManyCustomers { .. } => GeoscopeError::Validation(err.to_string()),
            RoutingError::CutLimit { .. } | RoutingError::Solver(_) => {
                GeoscopeError::Solver(err.to_string())
            }
        }
    }
}
