//! Local Moran's I (LISA) and Moran scatterplot data

use super::{center, rows_of, total_weight, StatsError};
use geoscope_core::{SpatialWeights, UnitKey};
use serde::Serialize;

/// Moran scatterplot quadrant of a unit: its own deviation against the
/// deviation of its spatial lag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Quadrant {
    /// High value surrounded by high values
    HighHigh,
    /// Low value surrounded by high values
    LowHigh,
    /// Low value surrounded by low values
    LowLow,
    /// High value surrounded by low values
    HighLow,
}

impl Quadrant {
    /// Classify from the unit's deviation and its lagged deviation.
    ///
    /// Zero counts as low on both axes.
    pub fn classify(z: f64, lag: f64) -> Self {
        match (z > 0.0, lag > 0.0) {
            (true, true) => Quadrant::HighHigh,
            (false, true) => Quadrant::LowHigh,
            (false, false) => Quadrant::LowLow,
            (true, false) => Quadrant::HighLow,
        }
    }

    /// Conventional numeric code (1 = HH, 2 = LH, 3 = LL, 4 = HL)
    pub fn code(&self) -> u8 {
        match self {
            Quadrant::HighHigh => 1,
            Quadrant::LowHigh => 2,
            Quadrant::LowLow => 3,
            Quadrant::HighLow => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::HighHigh => "HH",
            Quadrant::LowHigh => "LH",
            Quadrant::LowLow => "LL",
            Quadrant::HighLow => "HL",
        }
    }

    /// Whether the unit resembles its neighbors (HH or LL)
    pub fn is_cluster(&self) -> bool {
        matches!(self, Quadrant::HighHigh | Quadrant::LowLow)
    }
}

/// Local Moran's I for every unit, in unit order.
///
/// `I_i = N · z_i · Σ_j w_ij z_j / Σ_k z_k²`. Islands get zero.
pub fn local_moran<K: UnitKey>(y: &[f64], w: &SpatialWeights<K>) -> Result<Vec<f64>, StatsError> {
    let centered = center(y, w)?;
    total_weight(w)?;
    let rows = rows_of(w);
    Ok(local_statistics(&rows, &centered.z, centered.m2))
}

pub(crate) fn local_statistics(rows: &[&[(usize, f64)]], z: &[f64], m2: f64) -> Vec<f64> {
    let n = z.len() as f64;
    rows.iter()
        .zip(z)
        .map(|(row, zi)| n * zi * lagged(row, z) / m2)
        .collect()
}

pub(crate) fn lagged(row: &[(usize, f64)], z: &[f64]) -> f64 {
    row.iter().map(|&(j, w)| w * z[j]).sum()
}

/// Data behind a Moran scatterplot.
#[derive(Debug, Clone, Serialize)]
pub struct MoranScatter {
    /// `y_i - mean(y)`
    pub values: Vec<f64>,
    /// `lag_i - mean(lag)` with `lag = W y`
    pub lags: Vec<f64>,
    /// Least-squares slope of `lags` on `values`; equals Moran's I for
    /// row-standardized weights without islands
    pub slope: f64,
    pub quadrants: Vec<Quadrant>,
}

/// Centered values against centered spatial lags.
pub fn moran_scatter<K: UnitKey>(y: &[f64], w: &SpatialWeights<K>) -> Result<MoranScatter, StatsError> {
    let centered = center(y, w)?;
    total_weight(w)?;

    let lag = w.spatial_lag(y).map_err(|_| StatsError::LengthMismatch {
        expected: w.len(),
        actual: y.len(),
    })?;
    let lag_mean = lag.iter().sum::<f64>() / lag.len() as f64;
    let lags: Vec<f64> = lag.iter().map(|l| l - lag_mean).collect();

    let slope = centered
        .z
        .iter()
        .zip(&lags)
        .map(|(z, l)| z * (l / centered.scale))
        .sum::<f64>()
        / centered.m2;
    let quadrants = centered
        .z
        .iter()
        .zip(&lags)
        .map(|(&z, &l)| Quadrant::classify(z, l))
        .collect();

    Ok(MoranScatter {
        values: centered.values(),
        lags,
        slope,
        quadrants,
    })
}
