//! Global Geary's C

use super::{center, rows_of, squared_differences, total_weight, StatsError};
use geoscope_core::{SpatialWeights, UnitKey};

/// Global Geary's C of `y` over `w`.
///
/// `C = (N - 1) · Σ_i Σ_j w_ij (y_i - y_j)² / (2 · S0 · Σ z_i²)`.
/// Values below one indicate positive spatial autocorrelation, above one
/// negative, around one none.
pub fn geary_c<K: UnitKey>(y: &[f64], w: &SpatialWeights<K>) -> Result<f64, StatsError> {
    let centered = center(y, w)?;
    let s0 = total_weight(w)?;
    let rows = rows_of(w);
    Ok(geary_statistic(&rows, &centered.z, centered.m2, s0))
}

/// Differences of centered values equal differences of raw values.
pub(crate) fn geary_statistic(rows: &[&[(usize, f64)]], z: &[f64], m2: f64, s0: f64) -> f64 {
    (z.len() as f64 - 1.0) * squared_differences(rows, z) / (2.0 * s0 * m2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoscope_core::Contiguity;

    #[test]
    fn hand_computed_path() {
        let w = SpatialWeights::lattice(1, 3, Contiguity::Rook).unwrap();
        // Σ w (y_i - y_j)² = 2 * (1 + 1) = 4, m2 = 2, S0 = 4
        // C = 2 * 4 / (2 * 4 * 2) = 0.5
        let c = geary_c(&[1.0, 2.0, 3.0], &w).unwrap();
        assert!((c - 0.5).abs() < 1e-12);
    }

    #[test]
    fn smooth_below_one_alternating_above_one() {
        let w = SpatialWeights::lattice(6, 6, Contiguity::Rook).unwrap();
        let smooth: Vec<f64> = (0..36).map(|i| (i / 6 + i % 6) as f64).collect();
        let checkerboard: Vec<f64> = (0..36)
            .map(|i| if (i / 6 + i % 6) % 2 == 0 { 10.0 } else { -10.0 })
            .collect();

        assert!(geary_c(&smooth, &w).unwrap() < 1.0);
        assert!(geary_c(&checkerboard, &w).unwrap() > 1.0);
    }

    #[test]
    fn zero_variance_fails() {
        let w = SpatialWeights::lattice(2, 3, Contiguity::Queen).unwrap();
        assert_eq!(
            geary_c(&[2.5; 6], &w).unwrap_err(),
            StatsError::ZeroVariance
        );
    }

    #[test]
    fn no_weights_fails() {
        let isolated = SpatialWeights::from_links(vec![1, 2, 3], Vec::new()).unwrap();
        assert_eq!(
            geary_c(&[1.0, 2.0, 3.0], &isolated).unwrap_err(),
            StatsError::NoWeights
        );
    }

    #[test]
    fn huge_values_give_the_same_statistic() {
        let w = SpatialWeights::lattice(1, 3, Contiguity::Rook).unwrap();
        let c = geary_c(&[1e200, 2e200, 3e200], &w).unwrap();
        assert!((c - 0.5).abs() < 1e-9);
    }
}
