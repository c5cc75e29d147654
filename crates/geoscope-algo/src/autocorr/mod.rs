//! Spatial autocorrelation
//!
//! Global and local indices measuring whether similar values cluster in
//! space, computed over a [`SpatialWeights`] graph.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SPATIAL AUTOCORRELATION                                                │
//! │  ───────────────────────                                                │
//! │                                                                         │
//! │  z_i = y_i - ȳ          m2 = Σ z_i²          S0 = Σ_i Σ_j w_ij         │
//! │                                                                         │
//! │  Moran's I   I   = N · Σ_i Σ_j w_ij z_i z_j / (S0 · m2)                 │
//! │  Geary's C   C   = (N-1) · Σ_i Σ_j w_ij (y_i - y_j)² / (2 · S0 · m2)    │
//! │  Local I     I_i = N · z_i · Σ_j w_ij z_j / m2                          │
//! │                                                                         │
//! │  I > E[I] = -1/(N-1)   similar values cluster                           │
//! │  C < 1                 similar values cluster                           │
//! │  C > 1                 neighbors tend to differ                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Local values decompose the global index: `Σ_i I_i = S0 · I`, which is
//! `N · I` for row-standardized weights without islands.
//!
//! Statistics never return NaN: constant observations, empty input and
//! graphs without any weight are reported as [`StatsError`].
//!
//! Significance is assessed by permutation ([`MoranTest`], [`GearyTest`],
//! [`LocalMoranTest`]): observations are reshuffled over the units while
//! the graph stays fixed, and the folded pseudo p-value
//! `(min(larger, P - larger) + 1) / (P + 1)` is reported.
//!
//! ## References
//!
//! - **Moran (1950)**: "Notes on Continuous Stochastic Phenomena"
//! - **Geary (1954)**: "The Contiguity Ratio and Statistical Mapping"
//! - **Anselin (1995)**: "Local Indicators of Spatial Association—LISA"

mod geary;
mod inference;
mod local;
mod moran;

pub use geary::geary_c;
pub use inference::{GearyTest, LocalMoranTest, MoranTest};
pub use local::{local_moran, moran_scatter, MoranScatter, Quadrant};
pub use moran::moran_i;

use geoscope_core::{GeoscopeError, SpatialWeights, UnitKey};
use thiserror::Error;

/// Degenerate or malformed input to a statistic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("no observations")]
    EmptyInput,

    #[error("expected {expected} observations (one per spatial unit), got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("observation for unit {unit} is not finite")]
    NonFinite { unit: String },

    #[error("observations have zero variance; the statistic is undefined")]
    ZeroVariance,

    #[error("weights graph has no links (S0 = 0); the statistic is undefined")]
    NoWeights,

    #[error("invalid inference settings: {0}")]
    InvalidConfig(String),
}

impl From<StatsError> for GeoscopeError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::LengthMismatch { .. } | StatsError::NonFinite { .. } => {
                GeoscopeError::Validation(err.to_string())
            }
            StatsError::InvalidConfig(msg) => GeoscopeError::Config(msg),
            other => GeoscopeError::Statistics(other.to_string()),
        }
    }
}

/// Deviations from the mean of `y / scale` and their sum of squares.
///
/// Every statistic here is invariant to the scale of `y`; only
/// [`Centered::values`] maps back to the units of the input.
#[derive(Debug)]
pub(crate) struct Centered {
    pub z: Vec<f64>,
    pub m2: f64,
    /// `max |y|`
    pub scale: f64,
}

impl Centered {
    pub fn n(&self) -> f64 {
        self.z.len() as f64
    }

    /// Deviations from the mean in the units of `y`
    pub fn values(&self) -> Vec<f64> {
        self.z.iter().map(|z| z * self.scale).collect()
    }
}

/// Validate `y` against `w` and center it.
pub(crate) fn center<K: UnitKey>(y: &[f64], w: &SpatialWeights<K>) -> Result<Centered, StatsError> {
    if y.is_empty() || w.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    if y.len() != w.len() {
        return Err(StatsError::LengthMismatch {
            expected: w.len(),
            actual: y.len(),
        });
    }
    if let Some(i) = y.iter().position(|v| !v.is_finite()) {
        return Err(StatsError::NonFinite {
            unit: w.id(i).to_string(),
        });
    }

    // Squares of large finite inputs would overflow; work in units of max |y|
    let scale = y.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 {
        return Err(StatsError::ZeroVariance);
    }

    let n = y.len() as f64;
    let mean = y.iter().map(|v| v / scale).sum::<f64>() / n;
    let z: Vec<f64> = y.iter().map(|v| v / scale - mean).collect();
    let m2: f64 = z.iter().map(|v| v * v).sum();

    // Rounding in the mean leaves tiny residuals for constant input
    if m2 <= n * 1e-24 {
        return Err(StatsError::ZeroVariance);
    }

    Ok(Centered { z, m2, scale })
}

/// S0, failing when the graph carries no weight at all.
pub(crate) fn total_weight<K: UnitKey>(w: &SpatialWeights<K>) -> Result<f64, StatsError> {
    let s0 = w.s0();
    if s0 <= 0.0 {
        return Err(StatsError::NoWeights);
    }
    Ok(s0)
}

/// Borrowed neighbor rows, shareable across worker threads.
pub(crate) type Rows<'a> = Vec<&'a [(usize, f64)]>;

pub(crate) fn rows_of<K: UnitKey>(w: &SpatialWeights<K>) -> Rows<'_> {
    (0..w.len()).map(|i| w.neighbors(i)).collect()
}

/// Σ_i Σ_j w_ij z_i z_j
pub(crate) fn cross_product(rows: &[&[(usize, f64)]], z: &[f64]) -> f64 {
    rows.iter()
        .zip(z)
        .map(|(row, zi)| zi * row.iter().map(|&(j, w)| w * z[j]).sum::<f64>())
        .sum()
}

/// Σ_i Σ_j w_ij (z_i - z_j)²
pub(crate) fn squared_differences(rows: &[&[(usize, f64)]], z: &[f64]) -> f64 {
    rows.iter()
        .zip(z)
        .map(|(row, zi)| {
            row.iter()
                .map(|&(j, w)| {
                    let d = zi - z[j];
                    w * d * d
                })
                .sum::<f64>()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoscope_core::Contiguity;

    #[test]
    fn center_rejects_degenerate_input() {
        let w = SpatialWeights::lattice(1, 3, Contiguity::Rook).unwrap();

        assert_eq!(center(&[], &w).unwrap_err(), StatsError::EmptyInput);
        assert_eq!(
            center(&[1.0, 2.0], &w).unwrap_err(),
            StatsError::LengthMismatch {
                expected: 3,
                actual: 2
            }
        );
        assert_eq!(
            center(&[1.0, f64::NAN, 2.0], &w).unwrap_err(),
            StatsError::NonFinite { unit: "1".into() }
        );
        assert_eq!(
            center(&[0.1, 0.1, 0.1], &w).unwrap_err(),
            StatsError::ZeroVariance
        );
    }

    #[test]
    fn center_subtracts_mean() {
        let w = SpatialWeights::lattice(1, 3, Contiguity::Rook).unwrap();
        let c = center(&[1.0, 2.0, 6.0], &w).unwrap();
        assert_eq!(c.scale, 6.0);
        for (got, want) in c.values().iter().zip([-2.0, -1.0, 3.0]) {
            assert!((got - want).abs() < 1e-12);
        }
        assert!((c.m2 * 36.0 - 14.0).abs() < 1e-12);
    }

    #[test]
    fn huge_finite_input_is_centered_without_overflow() {
        let w = SpatialWeights::lattice(1, 3, Contiguity::Rook).unwrap();
        let c = center(&[1e300, 2e300, 6e300], &w).unwrap();
        assert!(c.m2.is_finite() && c.m2 > 0.0);
        assert_eq!(
            center(&[1e300; 3], &w).unwrap_err(),
            StatsError::ZeroVariance
        );
    }

    #[test]
    fn stats_error_converts_to_workspace_error() {
        let err: GeoscopeError = StatsError::ZeroVariance.into();
        assert!(matches!(err, GeoscopeError::Statistics(_)));
        let err: GeoscopeError = StatsError::LengthMismatch {
            expected: 2,
            actual: 1,
        }
        .into();
        assert!(matches!(err, GeoscopeError::Validation(_)));
    }
}
