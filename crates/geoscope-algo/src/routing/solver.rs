//! VRP MILP solver
//!
//! Builds the arc formulation for one fleet size at a time and walks fleet
//! sizes upward until one is feasible.

use super::problem::VrpProblem;
use super::solution::{AttemptOutcome, FleetAttempt, RouteArc, VehicleRoute, VrpSolution};
use super::subtour::{customer_subsets, find_subtours, order_route};
use super::{RoutingError, SubtourStrategy};
use crate::config::RoutingConfig;
use crate::milp::{LinearExpr, MilpOutcome, MilpSolution, Model, Relation, Sense, VarId, VarKind};
use geoscope_core::{CostMatrix, DEPOT};
use std::collections::{BTreeMap, BTreeSet};
use web_time::Instant;

/// Hard cap on exhaustive enumeration whatever the configuration says.
const MAX_ENUMERABLE_CUSTOMERS: usize = 20;

/// Solve with the smallest feasible fleet in
/// `config.min_vehicles..=config.max_vehicles`.
///
/// Infeasible fleet sizes are recorded in [`VrpSolution::attempts`]. When
/// none is feasible the result is [`RoutingError::NoSolution`].
pub fn solve_vrp(problem: &VrpProblem, config: &RoutingConfig) -> Result<VrpSolution, RoutingError> {
    validate_config(config)?;

    let customers = problem.customer_count();
    if config.subtour_strategy == SubtourStrategy::Exhaustive {
        let limit = config
            .max_exhaustive_customers
            .min(MAX_ENUMERABLE_CUSTOMERS);
        if customers > limit {
            return Err(RoutingError::TooManyCustomers { customers, limit });
        }
    }

    // Every vehicle leaves the depot towards its own customer
    let max_vehicles = config.max_vehicles.min(customers);
    if max_vehicles < config.max_vehicles {
        tracing::debug!(
            requested = config.max_vehicles,
            customers,
            "fleet size capped at customer count"
        );
    }

    let start = Instant::now();
    let mut pool: BTreeSet<Vec<usize>> = match config.subtour_strategy {
        SubtourStrategy::Exhaustive => {
            let nodes: Vec<usize> = problem.costs().customers().collect();
            customer_subsets(&nodes).into_iter().collect()
        }
        SubtourStrategy::Lazy => BTreeSet::new(),
    };
    let mut attempts = Vec::new();

    for vehicles in config.min_vehicles..=max_vehicles {
        let attempt_start = Instant::now();
        let mut formulation = Formulation::build(problem, vehicles);
        for cut in &pool {
            formulation.add_subtour_cut(cut);
        }

        let mut rounds = 0;
        let found = loop {
            let outcome = formulation.model.solve(config.backend)?;
            let solution = match outcome {
                MilpOutcome::Solved(solution) => solution,
                MilpOutcome::Infeasible => break None,
                MilpOutcome::Unbounded => {
                    return Err(RoutingError::Solver(
                        "routing model reported unbounded".to_string(),
                    ))
                }
            };

            let arcs = formulation.selected_arcs(&solution);
            let subtours = formulation.subtours(&arcs);
            if subtours.is_empty() {
                break Some(arcs);
            }
            if config.subtour_strategy == SubtourStrategy::Exhaustive {
                return Err(RoutingError::Solver(format!(
                    "solution contains subtour {:?} despite exhaustive cuts",
                    subtours[0]
                )));
            }
            if rounds == config.max_cut_rounds {
                tracing::warn!(vehicles, rounds, "lazy subtour cuts did not converge");
                return Err(RoutingError::CutLimit { vehicles, rounds });
            }

            rounds += 1;
            tracing::debug!(
                vehicles,
                round = rounds,
                new_cuts = subtours.len(),
                "adding subtour cuts"
            );
            for subtour in subtours {
                formulation.add_subtour_cut(&subtour);
                pool.insert(subtour);
            }
        };

        let outcome = if found.is_some() {
            AttemptOutcome::Solved
        } else {
            AttemptOutcome::Infeasible
        };
        tracing::debug!(vehicles, ?outcome, cut_rounds = rounds, "fleet size attempted");
        attempts.push(FleetAttempt {
            vehicles,
            outcome,
            cut_rounds: rounds,
            solve_time: attempt_start.elapsed(),
        });

        if let Some(arcs) = found {
            let routes = build_routes(problem, vehicles, &arcs)?;
            let total_cost: f64 = arcs
                .iter()
                .map(|a| problem.costs().get(a.from, a.to))
                .sum();
            tracing::info!(vehicles, total_cost, "routing solved");
            return Ok(VrpSolution {
                vehicles,
                arcs,
                routes,
                total_cost,
                attempts,
                cuts: pool.len(),
                solve_time: start.elapsed(),
            });
        }
    }

    tracing::info!(max_vehicles = config.max_vehicles, "no feasible fleet size");
    Err(RoutingError::NoSolution {
        max_vehicles: config.max_vehicles,
    })
}

/// Single-vehicle tour through every customer.
pub fn solve_tsp(costs: CostMatrix, config: &RoutingConfig) -> Result<VrpSolution, RoutingError> {
    let problem = VrpProblem::tsp(costs)?;
    let config = RoutingConfig {
        min_vehicles: 1,
        max_vehicles: 1,
        ..config.clone()
    };
    solve_vrp(&problem, &config)
}

fn validate_config(config: &RoutingConfig) -> Result<(), RoutingError> {
    if config.min_vehicles == 0 {
        return Err(RoutingError::InvalidProblem(
            "min_vehicles must be at least 1".to_string(),
        ));
    }
    if config.min_vehicles > config.max_vehicles {
        return Err(RoutingError::InvalidProblem(format!(
            "min_vehicles {} exceeds max_vehicles {}",
            config.min_vehicles, config.max_vehicles
        )));
    }
    Ok(())
}

/// Arc model for a fixed fleet size
struct Formulation {
    model: Model,
    /// `(vehicle, from, to) -> x`
    vars: BTreeMap<(usize, usize, usize), VarId>,
    vehicles: usize,
    node_count: usize,
}

impl Formulation {
    fn build(problem: &VrpProblem, vehicles: usize) -> Self {
        let costs = problem.costs();
        let n = costs.size();
        let mut model = Model::new();
        let mut vars = BTreeMap::new();
        let mut objective = LinearExpr::new();

        for k in 0..vehicles {
            for i in 0..n {
                for j in 0..n {
                    if let Some(cost) = costs.arc_cost(i, j) {
                        let x = model.add_variable(VarKind::Binary);
                        objective.add_term(x, cost);
                        vars.insert((k, i, j), x);
                    }
                }
            }
        }
        model.set_objective(Sense::Minimize, objective);

        let mut formulation = Self {
            model,
            vars,
            vehicles,
            node_count: n,
        };

        // Each customer entered exactly once over all vehicles
        for j in costs.customers() {
            let expr = formulation.sum_over(|_, _, to| to == j);
            formulation.model.add_constraint(expr, Relation::Eq, 1.0);
        }

        for k in 0..vehicles {
            let leave = formulation.sum_over(|v, i, _| v == k && i == DEPOT);
            formulation.model.add_constraint(leave, Relation::Eq, 1.0);
            let enter = formulation.sum_over(|v, _, j| v == k && j == DEPOT);
            formulation.model.add_constraint(enter, Relation::Eq, 1.0);

            for node in costs.customers() {
                let mut flow = formulation.sum_over(|v, _, j| v == k && j == node);
                for (&(v, i, _), &x) in &formulation.vars {
                    if v == k && i == node {
                        flow.add_term(x, -1.0);
                    }
                }
                formulation.model.add_constraint(flow, Relation::Eq, 0.0);
            }

            if let Some(capacity) = problem.capacity() {
                let mut load = LinearExpr::new();
                for (&(v, _, j), &x) in &formulation.vars {
                    let demand = problem.demand(j);
                    if v == k && demand > 0 {
                        load.add_term(x, f64::from(demand));
                    }
                }
                if !load.is_empty() {
                    formulation
                        .model
                        .add_constraint(load, Relation::Le, f64::from(capacity));
                }
            }
        }

        tracing::trace!(
            vehicles,
            variables = formulation.model.variable_count(),
            constraints = formulation.model.constraint_count(),
            "routing model built"
        );
        formulation
    }

    /// Sum of every `x_kij` whose key satisfies `select`.
    fn sum_over(&self, select: impl Fn(usize, usize, usize) -> bool) -> LinearExpr {
        LinearExpr::sum(
            self.vars
                .iter()
                .filter(|(&(k, i, j), _)| select(k, i, j))
                .map(|(_, &x)| x),
        )
    }

    /// `Σ_{i,j ∈ S} x_ijk <= |S| - 1` for every vehicle.
    fn add_subtour_cut(&mut self, subset: &[usize]) {
        let bound = subset.len() as f64 - 1.0;
        for k in 0..self.vehicles {
            let expr =
                self.sum_over(|v, i, j| v == k && subset.contains(&i) && subset.contains(&j));
            if expr.terms().len() as f64 > bound {
                self.model.add_constraint(expr, Relation::Le, bound);
            }
        }
    }

    fn selected_arcs(&self, solution: &MilpSolution) -> Vec<RouteArc> {
        let mut arcs: Vec<RouteArc> = self
            .vars
            .iter()
            .filter(|(_, &x)| solution.is_set(x))
            .map(|(&(vehicle, from, to), _)| RouteArc { vehicle, from, to })
            .collect();
        arcs.sort();
        arcs
    }

    /// Distinct customer cycles over all vehicles.
    fn subtours(&self, arcs: &[RouteArc]) -> Vec<Vec<usize>> {
        let mut found = BTreeSet::new();
        for k in 0..self.vehicles {
            let pairs = vehicle_pairs(arcs, k);
            found.extend(find_subtours(self.node_count, &pairs));
        }
        found.into_iter().collect()
    }
}

fn vehicle_pairs(arcs: &[RouteArc], vehicle: usize) -> Vec<(usize, usize)> {
    arcs.iter()
        .filter(|a| a.vehicle == vehicle)
        .map(|a| (a.from, a.to))
        .collect()
}

fn build_routes(
    problem: &VrpProblem,
    vehicles: usize,
    arcs: &[RouteArc],
) -> Result<Vec<VehicleRoute>, RoutingError> {
    (0..vehicles)
        .map(|vehicle| {
            let pairs = vehicle_pairs(arcs, vehicle);
            let stops = order_route(&pairs).ok_or_else(|| {
                RoutingError::Solver(format!("vehicle {vehicle} does not form a closed route"))
            })?;
            let load: u64 = stops.iter().map(|&n| u64::from(problem.demand(n))).sum();
            let cost: f64 = stops
                .windows(2)
                .map(|w| problem.costs().get(w[0], w[1]))
                .sum();
            Ok(VehicleRoute {
                vehicle,
                stops,
                load,
                cost,
            })
        })
        .collect()
}
