//! Static map rendering for gridded temperature fields.
//!
//! Implements:
//! - Colour binning with fixed min/max/step levels
//! - Block rendering, one square of pixels per grid cell, north-up
//! - Boundary outline overlay
//! - Title annotation from a runtime-loaded TrueType font
//! - PNG encoding (indexed or RGBA)

pub mod annotate;
pub mod map;
pub mod overlay;
pub mod png;
pub mod raster;

pub use map::{render_map, render_to_file, MapImage, RenderOptions};
pub use overlay::MapFrame;
