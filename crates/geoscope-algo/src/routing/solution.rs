//! Routing solution data structures

use serde::Serialize;
use std::time::Duration;

/// Vehicle `vehicle` drives directly from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RouteArc {
    pub vehicle: usize,
    pub from: usize,
    pub to: usize,
}

/// Closed tour of one vehicle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleRoute {
    pub vehicle: usize,
    /// Visited nodes, starting and ending at the depot
    pub stops: Vec<usize>,
    /// Total demand served
    pub load: u64,
    pub cost: f64,
}

impl VehicleRoute {
    /// Customers in visiting order
    pub fn customers(&self) -> &[usize] {
        let end = self.stops.len().saturating_sub(1);
        &self.stops[1.min(end)..end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptOutcome {
    Infeasible,
    Solved,
}

/// Result of one fleet size in the outer search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetAttempt {
    pub vehicles: usize,
    pub outcome: AttemptOutcome,
    /// Lazy cut rounds spent on this fleet size
    pub cut_rounds: usize,
    pub solve_time: Duration,
}

/// Optimal routes for the smallest feasible fleet
#[derive(Debug, Clone, Serialize)]
pub struct VrpSolution {
    /// Fleet size actually required
    pub vehicles: usize,
    /// Selected arcs `(vehicle, i, j)`
    pub arcs: Vec<RouteArc>,
    pub routes: Vec<VehicleRoute>,
    /// Sum of selected arc costs, recomputed from the matrix
    pub total_cost: f64,
    /// Every fleet size tried, in order
    pub attempts: Vec<FleetAttempt>,
    /// Subtour cuts in the final model
    pub cuts: usize,
    pub solve_time: Duration,
}

impl VrpSolution {
    /// Load per vehicle, in vehicle order
    pub fn loads(&self) -> Vec<u64> {
        self.routes.iter().map(|r| r.load).collect()
    }

    /// Arcs driven by `vehicle`
    pub fn arcs_of(&self, vehicle: usize) -> impl Iterator<Item = &RouteArc> + '_ {
        self.arcs.iter().filter(move |a| a.vehicle == vehicle)
    }

    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("VRP Solution Summary\n{}\n", "=".repeat(40)));
        s.push_str(&format!("Vehicles: {}\n", self.vehicles));
        s.push_str(&format!("Total Cost: {:.2}\n", self.total_cost));
        s.push_str(&format!(
            "Fleet Sizes Tried: {}\n",
            self.attempts
                .iter()
                .map(|a| a.vehicles.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        s.push_str(&format!("Subtour Cuts: {}\n", self.cuts));
        s.push_str(&format!("Solve Time: {:.2?}\n", self.solve_time));

        s.push_str("\nRoutes:\n");
        for route in &self.routes {
            let path = route
                .stops
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            s.push_str(&format!(
                "  Vehicle {}: {} (cost {:.2}, load {})\n",
                route.vehicle, path, route.cost, route.load
            ));
        }
        s
    }
}
