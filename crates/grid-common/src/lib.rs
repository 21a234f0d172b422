//! Common types and utilities shared across the airmap crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod style;

pub use bbox::BoundingBox;
pub use crs::{resolve_crs, CrsCode, CrsDefinition, CrsLike, CrsParseError, CrsResolution};
pub use error::{GridError, GridResult};
pub use grid::{GeoBox, GeoTransform};
pub use style::{Color, ColorScale, ColorStop, OutOfRangeBehavior};
