//! Coordinate reference system transformations.
//!
//! Implements the handful of map projections the boundary layers and
//! reanalysis grids use, from scratch without external dependencies.

pub mod albers;
pub mod ellipsoid;
pub mod error;
pub mod mercator;
pub mod transform;

pub use albers::AlbersEqualArea;
pub use ellipsoid::Ellipsoid;
pub use error::{ProjectionError, ProjectionResult};
pub use mercator::WebMercator;
pub use transform::{MapProjection, Reprojector};
