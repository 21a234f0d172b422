//! NetCDF reader for gridded reanalysis data.
//!
//! This crate opens NetCDF-3/4 files through libnetcdf and hands back
//! [`grid_processor::GriddedField`]s with decoded time axes and unpacked
//! values.
//!
//! # Implementation Notes
//!
//! The native library prints HDF5 diagnostics for every optional attribute
//! it fails to find; [`silence_hdf5_errors`] turns that off and is called
//! before each open.
//!
//! # Reanalysis File Structure
//!
//! The NCEP 2 m air temperature files hold one year each
//! (`air.2m.gauss.<year>.nc`) with an `air(time, lat, lon)` variable in
//! Kelvin on a Gaussian grid: latitudes run north to south, longitudes span
//! 0 to 360 and time is `hours since 1800-01-01`.

pub mod error;
pub mod native;
pub mod paths;
pub mod time;

pub use error::{NetCdfError, NetCdfResult};
pub use native::{
    describe, open_gridded_field, open_gridded_field_at, silence_hdf5_errors, DatasetSummary,
    DimensionSummary, VariableSummary,
};
pub use paths::{dataset_path, reanalysis_path, year_of, DEFAULT_FILE_PATTERN};
pub use time::{CfTimeUnits, TimeUnit};
