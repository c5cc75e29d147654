//! # geoscope-algo: Spatial Statistics and Routing Models
//!
//! Algorithms over the inputs defined in `geoscope-core`: spatial
//! autocorrelation statistics on weights graphs, and small MILP models for
//! vehicle routing and facility location.
//!
//! ## Spatial Autocorrelation
//!
//! | Statistic | Function | Inference |
//! |-----------|----------|-----------|
//! | Global Moran's I | [`moran_i`] | [`MoranTest`] (normality + permutation) |
//! | Global Geary's C | [`geary_c`] | [`GearyTest`] (permutation) |
//! | Local Moran's I (LISA) | [`local_moran`] | [`LocalMoranTest`] (conditional permutation) |
//!
//! Permutation draws are seeded and run on `rayon` with the `parallel`
//! feature; results do not depend on the feature.
//!
//! ## Optimization
//!
//! - [`milp::Model`]: solver-independent MILP builder over `good_lp`
//! - [`routing`]: capacitated VRP / TSP, smallest feasible fleet first
//! - [`location`]: location set covering (LSCP)
//!
//! ## Example
//!
//! ```rust
//! use geoscope_algo::{moran_i, solve_tsp, RoutingConfig};
//! use geoscope_core::{Contiguity, CostMatrix, SpatialWeights};
//!
//! let w = SpatialWeights::lattice(3, 3, Contiguity::Rook)?.row_standardized();
//! let y = [1.0, 2.0, 3.0, 2.0, 3.0, 4.0, 3.0, 4.0, 5.0];
//! assert!(moran_i(&y, &w)? > 0.0);
//!
//! let costs = CostMatrix::new(vec![
//!     vec![0.0, 3.0, 4.0],
//!     vec![3.0, 0.0, 5.0],
//!     vec![4.0, 5.0, 0.0],
//! ])?;
//! let tour = solve_tsp(costs, &RoutingConfig::default())?;
//! assert!((tour.total_cost - 12.0).abs() < 1e-6);
//! # Ok::<(), geoscope_core::GeoscopeError>(())
//! ```

pub mod autocorr;
pub mod config;
pub mod location;
pub mod milp;
pub mod routing;

pub use autocorr::{
    geary_c, local_moran, moran_i, moran_scatter, GearyTest, LocalMoranTest, MoranScatter,
    MoranTest, Quadrant, StatsError,
};
pub use config::{AnalysisConfig, InferenceConfig, LocationConfig, RoutingConfig};
pub use location::{solve_lscp, LocationError, Lscp, LscpSolution};
pub use milp::{MilpBackend, MilpError, MilpOutcome, Model};
pub use routing::{
    solve_tsp, solve_vrp, RoutingError, SubtourStrategy, VehicleRoute, VrpProblem, VrpSolution,
};
