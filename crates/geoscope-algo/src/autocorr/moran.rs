//! Global Moran's I

use super::{center, cross_product, rows_of, total_weight, StatsError};
use geoscope_core::{SpatialWeights, UnitKey};

/// Global Moran's I of `y` over `w`.
///
/// `I = N · Σ_i Σ_j w_ij z_i z_j / (S0 · Σ z_i²)` with `z = y - mean(y)`.
/// Weights are used as given; row-standardize beforehand if desired.
///
/// # Errors
///
/// [`StatsError::ZeroVariance`] for constant `y`, [`StatsError::NoWeights`]
/// when `S0 == 0`, plus the input checks shared by all statistics.
pub fn moran_i<K: UnitKey>(y: &[f64], w: &SpatialWeights<K>) -> Result<f64, StatsError> {
    let centered = center(y, w)?;
    let s0 = total_weight(w)?;
    let rows = rows_of(w);
    Ok(moran_statistic(&rows, &centered.z, centered.m2, s0))
}

pub(crate) fn moran_statistic(rows: &[&[(usize, f64)]], z: &[f64], m2: f64, s0: f64) -> f64 {
    z.len() as f64 * cross_product(rows, z) / (s0 * m2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoscope_core::Contiguity;

    #[test]
    fn hand_computed_path() {
        // 0 - 1 - 2, binary weights, S0 = 4
        let w = SpatialWeights::lattice(1, 3, Contiguity::Rook).unwrap();
        // z = [-1, 0, 1], m2 = 2, cross = 2 * (-1*0 + 0*-1 + 0*1 + 1*0) = 0
        let i = moran_i(&[1.0, 2.0, 3.0], &w).unwrap();
        assert!(i.abs() < 1e-12);

        // z = [-1/3, 2/3, -1/3]: every link pairs opposite signs
        let i = moran_i(&[1.0, 2.0, 1.0], &w).unwrap();
        // cross = 4 * (-1/3 * 2/3) = -8/9, m2 = 6/9, I = 3 * (-8/9) / (4 * 6/9) = -1
        assert!((i + 1.0).abs() < 1e-12);
    }

    #[test]
    fn does_not_restandardize() {
        let w = SpatialWeights::from_links(
            vec![0usize, 1, 2],
            vec![(0, 1, 2.0), (1, 0, 2.0), (1, 2, 1.0), (2, 1, 1.0)],
        )
        .unwrap();
        let y = [3.0, 5.0, 10.0];
        let raw = moran_i(&y, &w).unwrap();
        let standardized = moran_i(&y, &w.row_standardized()).unwrap();
        assert!((raw - standardized).abs() > 1e-6);
    }

    #[test]
    fn zero_variance_and_empty_weights_fail() {
        let w = SpatialWeights::lattice(2, 2, Contiguity::Rook).unwrap();
        assert_eq!(
            moran_i(&[7.0; 4], &w).unwrap_err(),
            StatsError::ZeroVariance
        );

        let isolated = SpatialWeights::from_links(vec![1, 2, 3], Vec::new()).unwrap();
        assert_eq!(
            moran_i(&[1.0, 2.0, 3.0], &isolated).unwrap_err(),
            StatsError::NoWeights
        );
    }

    #[test]
    fn huge_values_give_the_same_statistic() {
        let w = SpatialWeights::lattice(3, 3, Contiguity::Rook).unwrap();
        let y: Vec<f64> = (0..9).map(|i| (i / 3 + i % 3) as f64).collect();
        let huge: Vec<f64> = y.iter().map(|v| (v + 1.0) * 1e160).collect();

        let i = moran_i(&y, &w).unwrap();
        let scaled = moran_i(&huge, &w).unwrap();
        assert!(scaled.is_finite());
        assert!((i - scaled).abs() < 1e-9);
    }
}
