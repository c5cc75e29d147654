//! Travel cost matrices and customer demands for routing models.
//!
//! Node 0 is the depot, nodes `1..=N` are customers. Missing arcs are
//! represented by [`CostMatrix::NO_EDGE`] (positive infinity); the diagonal
//! is never a usable arc whatever value it holds.

use crate::diagnostics::Diagnostics;
use crate::error::{GeoscopeError, GeoscopeResult};
use serde::Serialize;
use std::ops::Range;

/// Index of the depot node
pub const DEPOT: usize = 0;

/// Square, possibly asymmetric, matrix of non-negative travel costs.
#[derive(Debug, Clone, Serialize)]
pub struct CostMatrix {
    size: usize,
    /// Row-major values
    values: Vec<f64>,
}

impl CostMatrix {
    /// Sentinel for "no arc"
    pub const NO_EDGE: f64 = f64::INFINITY;

    /// Build from rows. Rows must form a non-empty square matrix without NaN
    /// or negative off-diagonal entries.
    pub fn new(rows: Vec<Vec<f64>>) -> GeoscopeResult<Self> {
        let size = rows.len();
        if size == 0 {
            return Err(GeoscopeError::Validation("cost matrix is empty".into()));
        }
        let mut values = Vec::with_capacity(size * size);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(GeoscopeError::Validation(format!(
                    "cost matrix must be square: row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    size
                )));
            }
            values.extend(row);
        }
        let matrix = Self { size, values };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Build a `size x size` matrix from a cost function.
    pub fn from_fn(size: usize, f: impl Fn(usize, usize) -> f64) -> GeoscopeResult<Self> {
        let rows = (0..size)
            .map(|i| (0..size).map(|j| f(i, j)).collect())
            .collect();
        Self::new(rows)
    }

    fn validate(&self) -> GeoscopeResult<()> {
        for i in 0..self.size {
            for j in 0..self.size {
                let value = self.get(i, j);
                if value.is_nan() {
                    return Err(GeoscopeError::Validation(format!(
                        "cost matrix entry ({}, {}) is NaN",
                        i, j
                    )));
                }
                if i != j && value < 0.0 {
                    return Err(GeoscopeError::Validation(format!(
                        "cost matrix entry ({}, {}) is negative: {}",
                        i, j, value
                    )));
                }
            }
        }
        Ok(())
    }

    /// Number of nodes including the depot
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn customer_count(&self) -> usize {
        self.size - 1
    }

    /// Customer node indices
    pub fn customers(&self) -> Range<usize> {
        1..self.size
    }

    /// Raw entry, including the diagonal and sentinels
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    /// Cost of the arc `i -> j`, or `None` for the diagonal and missing arcs.
    pub fn arc_cost(&self, i: usize, j: usize) -> Option<f64> {
        if i == j {
            return None;
        }
        let value = self.get(i, j);
        value.is_finite().then_some(value)
    }

    /// Whether `c_ij == c_ji` for every off-diagonal pair within `tol`.
    ///
    /// Asymmetric matrices are valid; this is informative only.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        (0..self.size).all(|i| {
            (i + 1..self.size).all(|j| {
                let (a, b) = (self.get(i, j), self.get(j, i));
                a == b || (a - b).abs() <= tol
            })
        })
    }

    /// Report customers that cannot be entered or left through any arc.
    pub fn diagnose(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        for j in self.customers() {
            let entries = (0..self.size).filter_map(|i| self.arc_cost(i, j)).count();
            let exits = (0..self.size).filter_map(|k| self.arc_cost(j, k)).count();
            if entries == 0 {
                diag.add_error_with_unit("matrix", "customer has no incoming arc", &j.to_string());
            }
            if exits == 0 {
                diag.add_error_with_unit("matrix", "customer has no outgoing arc", &j.to_string());
            }
        }
        if !self.is_symmetric(1e-9) {
            diag.add_warning("symmetry", "travel costs are direction dependent");
        }
        diag
    }
}

/// Integer demand per node; the depot demands nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemandVector(Vec<u32>);

impl DemandVector {
    pub fn new(values: Vec<u32>) -> GeoscopeResult<Self> {
        match values.first() {
            None => Err(GeoscopeError::Validation("demand vector is empty".into())),
            Some(&d) if d != 0 => Err(GeoscopeError::Validation(format!(
                "depot demand must be 0, got {}",
                d
            ))),
            Some(_) => Ok(Self(values)),
        }
    }

    /// Demands for customers only; the depot entry is prepended.
    pub fn from_customers(customers: impl IntoIterator<Item = u32>) -> Self {
        Self(std::iter::once(0).chain(customers).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, node: usize) -> u32 {
        self.0[node]
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|&d| d as u64).sum()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}
