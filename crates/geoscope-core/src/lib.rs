//! # geoscope-core: Spatial Data Model
//!
//! Provides the inputs shared by the geoscope algorithms:
//!
//! - [`SpatialWeights`]: which spatial units are neighbors and how strongly,
//!   consumed by the autocorrelation statistics in `geoscope-algo`.
//! - [`CostMatrix`] and [`DemandVector`]: depot/customer travel costs and
//!   demands, consumed by the routing models.
//!
//! Where these come from (polygon contiguity, geocoding APIs, routing
//! services) is left to the caller; this crate only validates them.
//!
//! ## Quick Start
//!
//! ```rust
//! use geoscope_core::*;
//! use std::collections::HashMap;
//!
//! // Three tracts in a row, string keys
//! let ids = vec!["A".to_string(), "B".to_string(), "C".to_string()];
//! let w = SpatialWeights::from_links(
//!     ids,
//!     vec![
//!         ("A".to_string(), "B".to_string(), 1.0),
//!         ("B".to_string(), "A".to_string(), 1.0),
//!         ("B".to_string(), "C".to_string(), 1.0),
//!         ("C".to_string(), "B".to_string(), 1.0),
//!     ],
//! )?
//! .row_standardized();
//!
//! let prices: HashMap<String, f64> =
//!     [("A".to_string(), 120.0), ("B".to_string(), 95.0), ("C".to_string(), 80.0)]
//!         .into_iter()
//!         .collect();
//! let y = w.align(&prices)?;
//! assert_eq!(w.spatial_lag(&y)?, vec![95.0, 100.0, 95.0]);
//!
//! // Depot plus two customers
//! let costs = CostMatrix::new(vec![
//!     vec![0.0, 3.0, 4.0],
//!     vec![3.0, 0.0, 5.0],
//!     vec![4.0, 5.0, 0.0],
//! ])?;
//! assert_eq!(costs.customer_count(), 2);
//! # Ok::<(), GeoscopeError>(())
//! ```
//!
//! ## Modules
//!
//! - [`weights`] - Spatial weights graphs, transforms, lattice and KNN builders
//! - [`cost`] - Cost matrices and demand vectors
//! - [`graph_utils`] - Connectivity analysis of weights graphs (petgraph)
//! - [`diagnostics`] - Non-fatal issues found while inspecting inputs
//! - [`error`] - Unified error type

pub mod cost;
pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod weights;

pub use cost::{CostMatrix, DemandVector, DEPOT};
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{GeoscopeError, GeoscopeResult};
pub use graph_utils::{component_labels, weights_stats, ComponentAssignment, WeightsStats};
pub use weights::{Contiguity, SpatialWeights, UnitKey, WeightsTransform};
