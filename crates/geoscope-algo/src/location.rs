//! Location set covering problem (LSCP)
//!
//! Open the fewest facilities such that every client lies within the
//! service radius of at least one open facility.
//!
//! ```text
//! minimize    Σ_f y_f
//! subject to  Σ_{f : c_if ≤ r} y_f ≥ 1      ∀ client i
//!             y_f ∈ {0,1}
//! ```

use crate::config::LocationConfig;
use crate::milp::{LinearExpr, MilpBackend, MilpError, MilpOutcome, Model, Relation, Sense, VarKind};
use geoscope_core::GeoscopeError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("cost matrix has no clients or no facilities")]
    EmptyInput,

    #[error("client {client} has {len} costs, expected {expected}")]
    RaggedRow {
        client: usize,
        len: usize,
        expected: usize,
    },

    #[error("cost from client {client} to facility {facility} is NaN or negative")]
    InvalidCost { client: usize, facility: usize },

    #[error("service radius must be finite and non-negative, got {0}")]
    InvalidRadius(f64),

    #[error("client {client} has no facility within the service radius")]
    UncoverableClient { client: usize },

    #[error("solver failure: {0}")]
    Solver(String),
}

impl From<MilpError> for LocationError {
    fn from(err: MilpError) -> Self {
        LocationError::Solver(err.to_string())
    }
}

impl From<LocationError> for GeoscopeError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::Solver(msg) => GeoscopeError::Solver(msg),
            other => GeoscopeError::Validation(other.to_string()),
        }
    }
}

/// Client by facility coverage for a fixed service radius.
#[derive(Debug, Clone)]
pub struct Lscp {
    /// Facilities within range, per client
    coverage: Vec<Vec<usize>>,
    facilities: usize,
    service_radius: f64,
}

impl Lscp {
    /// `costs[i][f]` is the travel cost from client `i` to facility `f`;
    /// infinity marks an unreachable pair.
    pub fn from_cost_matrix(costs: &[Vec<f64>], service_radius: f64) -> Result<Self, LocationError> {
        if !service_radius.is_finite() || service_radius < 0.0 {
            return Err(LocationError::InvalidRadius(service_radius));
        }
        let facilities = costs.first().map_or(0, Vec::len);
        if costs.is_empty() || facilities == 0 {
            return Err(LocationError::EmptyInput);
        }

        let mut coverage = Vec::with_capacity(costs.len());
        for (client, row) in costs.iter().enumerate() {
            if row.len() != facilities {
                return Err(LocationError::RaggedRow {
                    client,
                    len: row.len(),
                    expected: facilities,
                });
            }
            if let Some(facility) = row.iter().position(|c| c.is_nan() || *c < 0.0) {
                return Err(LocationError::InvalidCost { client, facility });
            }
            let in_range: Vec<usize> = row
                .iter()
                .enumerate()
                .filter(|(_, &c)| c <= service_radius)
                .map(|(f, _)| f)
                .collect();
            if in_range.is_empty() {
                return Err(LocationError::UncoverableClient { client });
            }
            coverage.push(in_range);
        }

        Ok(Self {
            coverage,
            facilities,
            service_radius,
        })
    }

    pub fn client_count(&self) -> usize {
        self.coverage.len()
    }

    pub fn facility_count(&self) -> usize {
        self.facilities
    }

    pub fn service_radius(&self) -> f64 {
        self.service_radius
    }

    /// Facilities able to serve `client`
    pub fn candidates(&self, client: usize) -> &[usize] {
        &self.coverage[client]
    }

    pub fn solve(&self, backend: MilpBackend) -> Result<LscpSolution, LocationError> {
        let mut model = Model::new();
        let open: Vec<_> = (0..self.facilities)
            .map(|_| model.add_variable(VarKind::Binary))
            .collect();

        for candidates in &self.coverage {
            let expr = LinearExpr::sum(candidates.iter().map(|&f| open[f]));
            model.add_constraint(expr, Relation::Ge, 1.0);
        }
        model.set_objective(Sense::Minimize, LinearExpr::sum(open.iter().copied()));

        let solution = match model.solve(backend)? {
            MilpOutcome::Solved(solution) => solution,
            other => {
                return Err(LocationError::Solver(format!(
                    "covering model ended as {other:?}"
                )))
            }
        };

        let selected: Vec<usize> = (0..self.facilities)
            .filter(|&f| solution.is_set(open[f]))
            .collect();

        let mut fac2cli = vec![Vec::new(); self.facilities];
        let mut cli2fac = vec![Vec::new(); self.coverage.len()];
        for (client, candidates) in self.coverage.iter().enumerate() {
            for &f in candidates {
                if selected.contains(&f) {
                    fac2cli[f].push(client);
                    cli2fac[client].push(f);
                }
            }
        }

        tracing::info!(
            clients = self.coverage.len(),
            facilities = self.facilities,
            selected = selected.len(),
            "set covering solved"
        );

        Ok(LscpSolution {
            selected,
            fac2cli,
            cli2fac,
        })
    }
}

/// Open facilities and who they serve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LscpSolution {
    /// Open facilities, ascending
    pub selected: Vec<usize>,
    /// Per facility, the clients it covers; empty for closed facilities
    pub fac2cli: Vec<Vec<usize>>,
    /// Per client, the open facilities covering it
    pub cli2fac: Vec<Vec<usize>>,
}

impl LscpSolution {
    pub fn is_selected(&self, facility: usize) -> bool {
        self.selected.contains(&facility)
    }
}

/// Build and solve with the radius and backend from `config`.
pub fn solve_lscp(costs: &[Vec<f64>], config: &LocationConfig) -> Result<LscpSolution, LocationError> {
    Lscp::from_cost_matrix(costs, config.service_radius)?.solve(config.backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_facility_covers_everyone() {
        let costs = vec![vec![10.0, 1.0], vec![10.0, 2.0], vec![1.0, 3.0]];
        let solution = Lscp::from_cost_matrix(&costs, 5.0)
            .unwrap()
            .solve(MilpBackend::default())
            .unwrap();

        assert_eq!(solution.selected, vec![1]);
        assert_eq!(solution.fac2cli, vec![vec![], vec![0, 1, 2]]);
        assert_eq!(solution.cli2fac, vec![vec![1], vec![1], vec![1]]);
    }

    #[test]
    fn uncoverable_client_is_named() {
        let costs = vec![vec![1.0, 2.0], vec![9.0, f64::INFINITY]];
        assert_eq!(
            Lscp::from_cost_matrix(&costs, 5.0).unwrap_err(),
            LocationError::UncoverableClient { client: 1 }
        );
    }

    #[test]
    fn malformed_matrices_are_rejected() {
        assert_eq!(
            Lscp::from_cost_matrix(&[], 1.0).unwrap_err(),
            LocationError::EmptyInput
        );
        assert!(matches!(
            Lscp::from_cost_matrix(&[vec![1.0, 2.0], vec![1.0]], 1.0),
            Err(LocationError::RaggedRow { client: 1, .. })
        ));
        assert_eq!(
            Lscp::from_cost_matrix(&[vec![1.0, -2.0]], 1.0).unwrap_err(),
            LocationError::InvalidCost {
                client: 0,
                facility: 1
            }
        );
        assert!(Lscp::from_cost_matrix(&[vec![1.0]], f64::NAN).is_err());
    }
}
