//! Unified error types for the geoscope workspace
//!
//! This module provides a common error type [`GeoscopeError`] that can represent
//! errors from any part of the system. Domain-specific error types (statistics,
//! routing, location) convert into `GeoscopeError` for uniform handling at API
//! boundaries.
//!
//! # Example
//!
//! ```ignore
//! use geoscope_core::{GeoscopeError, GeoscopeResult};
//!
//! fn analyse(ids: Vec<usize>) -> GeoscopeResult<f64> {
//!     let weights = build_weights(ids)?;
//!     let index = moran_i(&values, &weights)?;
//!     Ok(index)
//! }
//! ```

use thiserror::Error;

/// Unified error type for all geoscope operations.
#[derive(Error, Debug)]
pub enum GeoscopeError {
    /// I/O errors (configuration files, exports)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// A unit key that is not part of the weights graph
    #[error("Unknown spatial unit: {unit}")]
    UnknownUnit { unit: String },

    /// A unit listed as its own neighbor
    #[error("Spatial unit {unit} is listed as its own neighbor")]
    SelfLoop { unit: String },

    /// The same unit key appears twice in the id list
    #[error("Spatial unit {unit} appears more than once")]
    DuplicateUnit { unit: String },

    /// A negative or non-finite weight
    #[error("Invalid weight {weight} between {unit} and {neighbor}")]
    InvalidWeight {
        unit: String,
        neighbor: String,
        weight: f64,
    },

    /// A unit of the weights graph without an observation
    #[error("No observation for spatial unit {unit}")]
    MissingObservation { unit: String },

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Statistical computation errors (degenerate input)
    #[error("Statistics error: {0}")]
    Statistics(String),

    /// Solver/algorithm errors
    #[error("Solver error: {0}")]
    Solver(String),

    /// The optimization model has no feasible solution
    #[error("No solution: {0}")]
    NoSolution(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using GeoscopeError.
pub type GeoscopeResult<T> = Result<T, GeoscopeError>;

// Conversion from anyhow::Error
impl From<anyhow::Error> for GeoscopeError {
    fn from(err: anyhow::Error) -> Self {
        GeoscopeError::Other(format!("{:#}", err))
    }
}

impl From<String> for GeoscopeError {
    fn from(s: String) -> Self {
        GeoscopeError::Other(s)
    }
}

impl From<&str> for GeoscopeError {
    fn from(s: &str) -> Self {
        GeoscopeError::Other(s.to_string())
    }
}

// JSON export errors
impl From<serde_json::Error> for GeoscopeError {
    fn from(err: serde_json::Error) -> Self {
        GeoscopeError::Parse(err.to_string())
    }
}
