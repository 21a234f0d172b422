//! Error types for NetCDF parsing operations.

use grid_common::GridError;
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error reported by libnetcdf
    #[error("NetCDF library error: {0}")]
    Library(#[from] netcdf::Error),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Unparseable CF time units or date label
    #[error("Invalid time: {0}")]
    InvalidTime(String),
}

impl From<NetCdfError> for GridError {
    fn from(err: NetCdfError) -> Self {
        match err {
            NetCdfError::IoError(e) => GridError::Io(e),
            NetCdfError::MissingData(msg) => GridError::MissingData(msg),
            NetCdfError::InvalidTime(msg) => GridError::InvalidTime(msg),
            other => GridError::NetCdfError(other.to_string()),
        }
    }
}
