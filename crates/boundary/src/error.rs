//! Error types for boundary layer reading.

use grid_common::GridError;
use thiserror::Error;

pub type BoundaryResult<T> = Result<T, BoundaryError>;

#[derive(Error, Debug)]
pub enum BoundaryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported boundary format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Boundary layer has no CRS; set one in the configuration")]
    MissingCrs,
}

impl From<BoundaryError> for GridError {
    fn from(err: BoundaryError) -> Self {
        match err {
            BoundaryError::Io(e) => GridError::Io(e),
            BoundaryError::MissingCrs => GridError::Configuration(err.to_string()),
            BoundaryError::UnsupportedFormat(_) => GridError::Configuration(err.to_string()),
            other => GridError::VectorError(other.to_string()),
        }
    }
}
