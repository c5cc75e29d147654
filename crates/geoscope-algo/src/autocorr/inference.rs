//! Permutation inference for the autocorrelation statistics.
//!
//! Each draw reshuffles the centered observations over the units and
//! recomputes the statistic with the graph held fixed. Draw `d` uses its own
//! RNG seeded from `(seed, d)`, so the reference distribution does not depend
//! on whether draws run in parallel.

use super::geary::geary_statistic;
use super::local::{lagged, local_statistics, Quadrant};
use super::moran::moran_statistic;
use super::{center, rows_of, total_weight, Centered, Rows, StatsError};
use crate::config::InferenceConfig;
use geoscope_core::{SpatialWeights, UnitKey};
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::SeedableRng;
use serde::Serialize;

/// Global Moran's I with analytical and permutation inference.
#[derive(Debug, Clone, Serialize)]
pub struct MoranTest {
    pub i: f64,
    /// E[I] = -1 / (N - 1)
    pub expected: f64,
    /// Variance of I under the normality assumption
    pub variance_norm: f64,
    pub z_norm: Option<f64>,
    pub sim_mean: f64,
    pub sim_std: f64,
    pub z_sim: Option<f64>,
    /// Folded pseudo p-value
    pub p_sim: f64,
    pub permutations: usize,
}

impl MoranTest {
    pub fn run<K: UnitKey>(
        y: &[f64],
        w: &SpatialWeights<K>,
        config: &InferenceConfig,
    ) -> Result<Self, StatsError> {
        config.validate()?;
        let centered = center(y, w)?;
        let s0 = total_weight(w)?;
        let rows = rows_of(w);
        let n = centered.n();

        let i = moran_statistic(&rows, &centered.z, centered.m2, s0);
        let expected = -1.0 / (n - 1.0);
        let variance_norm = normal_variance(w, n, s0, expected);

        let sims = simulate(config.permutations, config.seed, |rng| {
            let mut z = centered.z.clone();
            z.shuffle(rng);
            moran_statistic(&rows, &z, centered.m2, s0)
        });
        let (sim_mean, sim_std) = mean_std(&sims);

        tracing::debug!(
            i,
            expected,
            permutations = config.permutations,
            "moran permutation test"
        );

        Ok(Self {
            i,
            expected,
            variance_norm,
            z_norm: z_score(i, expected, variance_norm.sqrt()),
            sim_mean,
            sim_std,
            z_sim: z_score(i, sim_mean, sim_std),
            p_sim: folded_p_value(&sims, i),
            permutations: config.permutations,
        })
    }

    /// Whether the pseudo p-value is below `alpha`
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_sim < alpha
    }
}

/// Global Geary's C with permutation inference.
#[derive(Debug, Clone, Serialize)]
pub struct GearyTest {
    pub c: f64,
    /// E[C] = 1
    pub expected: f64,
    pub sim_mean: f64,
    pub sim_std: f64,
    pub z_sim: Option<f64>,
    pub p_sim: f64,
    pub permutations: usize,
}

impl GearyTest {
    pub fn run<K: UnitKey>(
        y: &[f64],
        w: &SpatialWeights<K>,
        config: &InferenceConfig,
    ) -> Result<Self, StatsError> {
        config.validate()?;
        let centered = center(y, w)?;
        let s0 = total_weight(w)?;
        let rows = rows_of(w);

        let c = geary_statistic(&rows, &centered.z, centered.m2, s0);
        let sims = simulate(config.permutations, config.seed, |rng| {
            let mut z = centered.z.clone();
            z.shuffle(rng);
            geary_statistic(&rows, &z, centered.m2, s0)
        });
        let (sim_mean, sim_std) = mean_std(&sims);

        Ok(Self {
            c,
            expected: 1.0,
            sim_mean,
            sim_std,
            z_sim: z_score(c, sim_mean, sim_std),
            p_sim: folded_p_value(&sims, c),
            permutations: config.permutations,
        })
    }

    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_sim < alpha
    }
}

/// Local Moran's I with conditional permutation inference.
///
/// For unit `i`, each draw assigns its neighbors values taken without
/// replacement from the other `N - 1` units, keeping `z_i` in place.
#[derive(Debug, Clone, Serialize)]
pub struct LocalMoranTest {
    /// Local statistic per unit
    pub lisa: Vec<f64>,
    pub quadrants: Vec<Quadrant>,
    /// Folded pseudo p-value per unit; islands get 1.0
    pub p_sim: Vec<f64>,
    pub permutations: usize,
}

impl LocalMoranTest {
    pub fn run<K: UnitKey>(
        y: &[f64],
        w: &SpatialWeights<K>,
        config: &InferenceConfig,
    ) -> Result<Self, StatsError> {
        config.validate()?;
        let centered = center(y, w)?;
        total_weight(w)?;
        let rows = rows_of(w);

        let lisa = local_statistics(&rows, &centered.z, centered.m2);
        let quadrants = rows
            .iter()
            .zip(&centered.z)
            .map(|(row, &z)| Quadrant::classify(z, lagged(row, &centered.z)))
            .collect();
        let p_sim = conditional_p_values(&rows, &centered, &lisa, config);

        Ok(Self {
            lisa,
            quadrants,
            p_sim,
            permutations: config.permutations,
        })
    }

    /// Quadrant of every unit with `p_sim < alpha`, `None` elsewhere.
    pub fn clusters(&self, alpha: f64) -> Vec<Option<Quadrant>> {
        self.quadrants
            .iter()
            .zip(&self.p_sim)
            .map(|(q, &p)| (p < alpha).then_some(*q))
            .collect()
    }

    /// Number of units with `p_sim < alpha`
    pub fn significant_count(&self, alpha: f64) -> usize {
        self.p_sim.iter().filter(|&&p| p < alpha).count()
    }
}

fn conditional_p_values(
    rows: &Rows<'_>,
    centered: &Centered,
    lisa: &[f64],
    config: &InferenceConfig,
) -> Vec<f64> {
    let n = centered.z.len();
    let scale = n as f64 / centered.m2;

    let unit_p_value = |i: usize| -> f64 {
        let row = rows[i];
        if row.is_empty() {
            return 1.0;
        }
        let k = row.len();
        let mut rng = StdRng::seed_from_u64(draw_seed(config.seed, i));
        let sims: Vec<f64> = (0..config.permutations)
            .map(|_| {
                let drawn = index::sample(&mut rng, n - 1, k);
                let lag: f64 = row
                    .iter()
                    .zip(drawn.iter())
                    .map(|(&(_, w), idx)| {
                        // Skip unit i itself
                        let j = if idx >= i { idx + 1 } else { idx };
                        w * centered.z[j]
                    })
                    .sum();
                scale * centered.z[i] * lag
            })
            .collect();
        folded_p_value(&sims, lisa[i])
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        (0..n).into_par_iter().map(unit_p_value).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..n).map(unit_p_value).collect()
    }
}

/// Run `permutations` independent draws of `statistic`.
fn simulate<F>(permutations: usize, seed: u64, statistic: F) -> Vec<f64>
where
    F: Fn(&mut StdRng) -> f64 + Sync + Send,
{
    let draw = |d: usize| {
        let mut rng = StdRng::seed_from_u64(draw_seed(seed, d));
        statistic(&mut rng)
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        (0..permutations).into_par_iter().map(draw).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..permutations).map(draw).collect()
    }
}

fn draw_seed(seed: u64, draw: usize) -> u64 {
    seed ^ (draw as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// `(min(larger, P - larger) + 1) / (P + 1)` where `larger` counts draws at
/// or above the observed value.
pub(crate) fn folded_p_value(sims: &[f64], observed: f64) -> f64 {
    let permutations = sims.len();
    let above = sims.iter().filter(|&&s| s >= observed).count();
    let larger = above.min(permutations - above);
    (larger as f64 + 1.0) / (permutations as f64 + 1.0)
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn z_score(value: f64, mean: f64, std: f64) -> Option<f64> {
    (std > 0.0 && std.is_finite()).then(|| (value - mean) / std)
}

/// Var(I) under normality:
/// `(N² S1 - N S2 + 3 S0²) / ((N² - 1) S0²) - E[I]²`
fn normal_variance<K: UnitKey>(w: &SpatialWeights<K>, n: f64, s0: f64, expected: f64) -> f64 {
    let mut s1 = 0.0;
    for (i, j, wij) in w.links() {
        if w.has_link(j, i) {
            // (j, i) adds the same term when it is visited
            s1 += (wij + w.weight(j, i)).powi(2);
        } else {
            s1 += 2.0 * wij.powi(2);
        }
    }
    s1 *= 0.5;

    let row_sums = w.row_sums();
    let mut col_sums = vec![0.0; w.len()];
    for (_, j, wij) in w.links() {
        col_sums[j] += wij;
    }
    let s2: f64 = row_sums
        .iter()
        .zip(&col_sums)
        .map(|(r, c)| (r + c).powi(2))
        .sum();

    let n2 = n * n;
    (n2 * s1 - n * s2 + 3.0 * s0 * s0) / ((n2 - 1.0) * s0 * s0) - expected * expected
}
