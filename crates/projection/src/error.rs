//! Error types for projection math.

use grid_common::GridError;
use thiserror::Error;

/// Result type for projection operations.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Error, Debug)]
pub enum ProjectionError {
    /// Point lies outside the projection's valid domain
    #[error("Point ({x}, {y}) is outside the domain of {crs}")]
    OutOfDomain { x: f64, y: f64, crs: String },

    /// Computation produced NaN or infinity
    #[error("Non-finite result projecting ({x}, {y}) to {crs}")]
    NonFinite { x: f64, y: f64, crs: String },

    /// Inverse series failed to converge
    #[error("Inverse projection did not converge for ({x}, {y})")]
    NoConvergence { x: f64, y: f64 },
}

impl From<ProjectionError> for GridError {
    fn from(err: ProjectionError) -> Self {
        GridError::ProjectionError(err.to_string())
    }
}
