//! Error types shared by the airmap crates.

use thiserror::Error;

use crate::crs::CrsParseError;
use crate::style::StyleError;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Primary error type for loading, selecting, masking and rendering grids.
#[derive(Debug, Error)]
pub enum GridError {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid CRS: {0}")]
    InvalidCrs(String),

    #[error("Invalid bounding box: {0}")]
    InvalidBbox(String),

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    // === Lookup Errors ===
    #[error("Label '{label}' not found in coordinate '{dim}'")]
    LabelNotFound { dim: String, label: String },

    #[error("Dimension not found: {0}")]
    DimensionNotFound(String),

    #[error("Selection on '{0}' is empty")]
    EmptySelection(String),

    // === Data Errors ===
    #[error("Expected {expected} non-singleton dimensions, found {found}")]
    InvalidDimensions { expected: usize, found: usize },

    #[error("Shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Unit mismatch: {0}")]
    UnitMismatch(String),

    #[error("Coordinate '{0}' is not monotonic")]
    NonMonotonicCoordinate(String),

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Invalid NetCDF data: {0}")]
    NetCdfError(String),

    #[error("Invalid vector data: {0}")]
    VectorError(String),

    // === Output Errors ===
    #[error("Projection error: {0}")]
    ProjectionError(String),

    #[error("Rendering failed: {0}")]
    RenderError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GridError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            GridError::Configuration(_)
            | GridError::InvalidCrs(_)
            | GridError::InvalidBbox(_)
            | GridError::InvalidTime(_) => 2,

            GridError::LabelNotFound { .. }
            | GridError::DimensionNotFound(_)
            | GridError::EmptySelection(_) => 3,

            GridError::InvalidDimensions { .. }
            | GridError::ShapeMismatch { .. }
            | GridError::UnitMismatch(_)
            | GridError::NonMonotonicCoordinate(_)
            | GridError::MissingData(_)
            | GridError::NetCdfError(_)
            | GridError::VectorError(_) => 4,

            _ => 1,
        }
    }
}

impl From<CrsParseError> for GridError {
    fn from(err: CrsParseError) -> Self {
        GridError::InvalidCrs(err.to_string())
    }
}

impl From<StyleError> for GridError {
    fn from(err: StyleError) -> Self {
        GridError::Configuration(err.to_string())
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::Configuration(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(GridError::Configuration("x".into()).exit_code(), 2);
        assert_eq!(
            GridError::LabelNotFound {
                dim: "time".into(),
                label: "1980-13-01".into()
            }
            .exit_code(),
            3
        );
        assert_eq!(GridError::UnitMismatch("x".into()).exit_code(), 4);
        assert_eq!(GridError::RenderError("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_crs_error_conversion() {
        let err: GridError = CrsParseError::UnsupportedCrs("EPSG:1".into()).into();
        assert!(matches!(err, GridError::InvalidCrs(_)));
    }
}
