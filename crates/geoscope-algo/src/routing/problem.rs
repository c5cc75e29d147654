//! Routing problem definition

use super::RoutingError;
use geoscope_core::{CostMatrix, DemandVector, DEPOT};

/// Depot, customers, costs and optional capacity data.
#[derive(Debug, Clone)]
pub struct VrpProblem {
    costs: CostMatrix,
    demands: Option<DemandVector>,
    capacity: Option<u32>,
}

impl VrpProblem {
    pub fn builder(costs: CostMatrix) -> VrpProblemBuilder {
        VrpProblemBuilder {
            costs,
            demands: None,
            capacity: None,
        }
    }

    /// Uncapacitated problem; solved with a single vehicle this is the TSP.
    pub fn tsp(costs: CostMatrix) -> Result<Self, RoutingError> {
        Self::builder(costs).build()
    }

    pub fn costs(&self) -> &CostMatrix {
        &self.costs
    }

    pub fn demands(&self) -> Option<&DemandVector> {
        self.demands.as_ref()
    }

    pub fn capacity(&self) -> Option<u32> {
        self.capacity
    }

    pub fn node_count(&self) -> usize {
        self.costs.size()
    }

    pub fn customer_count(&self) -> usize {
        self.costs.customer_count()
    }

    pub fn is_capacitated(&self) -> bool {
        self.capacity.is_some()
    }

    /// Demand of `node`, zero when uncapacitated.
    pub fn demand(&self, node: usize) -> u32 {
        self.demands.as_ref().map_or(0, |d| d.get(node))
    }

    pub fn total_demand(&self) -> u64 {
        self.demands.as_ref().map_or(0, DemandVector::total)
    }
}

pub struct VrpProblemBuilder {
    costs: CostMatrix,
    demands: Option<DemandVector>,
    capacity: Option<u32>,
}

impl VrpProblemBuilder {
    /// Demands for depot and customers; the depot entry must be zero.
    pub fn demands(mut self, demands: DemandVector) -> Self {
        self.demands = Some(demands);
        self
    }

    /// Demands for customers `1..=N` only.
    pub fn customer_demands(self, demands: impl IntoIterator<Item = u32>) -> Self {
        self.demands(DemandVector::from_customers(demands))
    }

    pub fn capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn build(self) -> Result<VrpProblem, RoutingError> {
        if self.costs.customer_count() == 0 {
            return Err(RoutingError::InvalidProblem(
                "cost matrix has no customers".to_string(),
            ));
        }

        match (&self.demands, self.capacity) {
            (Some(demands), Some(capacity)) => {
                if demands.len() != self.costs.size() {
                    return Err(RoutingError::InvalidProblem(format!(
                        "{} demands for {} nodes",
                        demands.len(),
                        self.costs.size()
                    )));
                }
                if capacity == 0 {
                    return Err(RoutingError::InvalidProblem(
                        "vehicle capacity must be positive".to_string(),
                    ));
                }
            }
            (None, None) => {}
            (Some(_), None) => {
                return Err(RoutingError::InvalidProblem(
                    "demands given without a vehicle capacity".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(RoutingError::InvalidProblem(
                    "vehicle capacity given without demands".to_string(),
                ))
            }
        }

        let costs = &self.costs;
        let leaves = costs.customers().any(|j| costs.arc_cost(DEPOT, j).is_some());
        let returns = costs.customers().any(|i| costs.arc_cost(i, DEPOT).is_some());
        if !leaves || !returns {
            return Err(RoutingError::InvalidProblem(
                "depot must have at least one outgoing and one incoming arc".to_string(),
            ));
        }

        let diagnostics = self.costs.diagnose();
        if diagnostics.has_errors() {
            return Err(RoutingError::InvalidProblem(diagnostics.summary()));
        }
        for issue in &diagnostics.issues {
            tracing::debug!(category = %issue.category, "{}", issue.message);
        }

        Ok(VrpProblem {
            costs: self.costs,
            demands: self.demands,
            capacity: self.capacity,
        })
    }
}
