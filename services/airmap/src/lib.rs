//! Air temperature map service library.
//!
//! Holds the configuration model and the two map workflows so they can be
//! driven from the `airmap` binary or from tests with in-memory fields.
//!
//! ```text
//! plot:  date ─► air.2m.gauss.<year>.nc ─► subset ─► K → °C ─► PNG + outline
//! mask:  date ─► subset ─► rasterize boundary ─► where ─► K → °C ─► PNG [+ GeoTIFF]
//! ```

pub mod config;
pub mod workflow;

pub use config::{AirmapConfig, RegionConfig, RegionsConfig, RenderConfig};
pub use workflow::{load_boundary, mask_field, plot_field, run_mask, run_plot, MaskOutput, PlotOutput};
