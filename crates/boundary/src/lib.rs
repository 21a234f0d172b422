//! Vector boundary layers for masking and map overlays.
//!
//! Reads polygon layers from ESRI shapefiles (with `.dbf` attributes and a
//! `.prj` CRS) or GeoJSON, and reprojects them into the CRS of a gridded
//! field.
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐
//! │ .shp + .dbf  │   │ .geojson/.json │
//! │   + .prj     │   │                │
//! └──────┬───────┘   └───────┬────────┘
//!        └────────┬──────────┘
//!                 ▼
//!        ┌─────────────────┐   to_crs    ┌─────────────────┐
//!        │  BoundaryLayer  │────────────▶│  BoundaryLayer  │
//!        │ (source CRS)    │             │ (field CRS)     │
//!        └─────────────────┘             └─────────────────┘
//! ```

pub mod error;
pub mod layer;
mod json;
mod prj;
mod shp;

use std::path::Path;

use grid_common::GridResult;
use tracing::info;

pub use error::{BoundaryError, BoundaryResult};
pub use json::parse_geojson;
pub use layer::{AttributeValue, BoundaryLayer, Feature};
pub use prj::crs_from_prj;

/// Read a boundary layer, choosing the reader from the file extension.
pub fn read_boundary(path: impl AsRef<Path>) -> GridResult<BoundaryLayer> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let layer = match extension.as_deref() {
        Some("shp") => shp::read_shapefile(path)?,
        Some("geojson") | Some("json") => json::read_geojson(path)?,
        _ => {
            return Err(BoundaryError::UnsupportedFormat(path.display().to_string()).into());
        }
    };

    info!(
        path = %path.display(),
        features = layer.len(),
        crs = layer.crs().map(|c| c.to_string()).unwrap_or_else(|| "none".into()),
        "Loaded boundary layer"
    );
    Ok(layer)
}
