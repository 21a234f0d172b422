//! Point reprojection between supported CRS codes.
//!
//! All coordinates are handled in traditional GIS order: x = longitude /
//! easting, y = latitude / northing, whatever the authority axis order says.

use grid_common::CrsCode;

use crate::albers::AlbersEqualArea;
use crate::error::{ProjectionError, ProjectionResult};
use crate::mercator::WebMercator;

/// A projection between geographic degrees and planar meters.
pub trait MapProjection: Send + Sync {
    /// Geographic (lon, lat) degrees to projected (x, y).
    fn project(&self, lon: f64, lat: f64) -> (f64, f64);

    /// Projected (x, y) to geographic (lon, lat) degrees.
    fn unproject(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)>;
}

impl MapProjection for AlbersEqualArea {
    fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        self.forward(lon, lat)
    }

    fn unproject(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        self.inverse(x, y)
    }
}

impl MapProjection for WebMercator {
    fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        self.forward(lon, lat)
    }

    fn unproject(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        self.inverse(x, y)
    }
}

/// Projection for a planar CRS; `None` for geographic ones.
///
/// EPSG:4269 and EPSG:4326 are both treated as plain lon/lat; the NAD83 to
/// WGS84 datum shift (about a meter) is ignored.
pub fn projection_for(code: CrsCode) -> Option<Box<dyn MapProjection>> {
    match code {
        CrsCode::Epsg4326 | CrsCode::Epsg4269 => None,
        CrsCode::Epsg3857 => Some(Box::new(WebMercator)),
        CrsCode::Epsg3577 => Some(Box::new(AlbersEqualArea::australian())),
        CrsCode::Epsg5070 => Some(Box::new(AlbersEqualArea::conus())),
    }
}

/// Transforms points from one CRS to another.
pub struct Reprojector {
    from: CrsCode,
    to: CrsCode,
    source: Option<Box<dyn MapProjection>>,
    target: Option<Box<dyn MapProjection>>,
}

impl std::fmt::Debug for Reprojector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reprojector")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

impl Reprojector {
    pub fn new(from: CrsCode, to: CrsCode) -> Self {
        Self {
            from,
            to,
            source: projection_for(from),
            target: projection_for(to),
        }
    }

    pub fn from_crs(&self) -> CrsCode {
        self.from
    }

    pub fn to_crs(&self) -> CrsCode {
        self.to
    }

    /// True when both ends share the same planar/geographic definition.
    pub fn is_identity(&self) -> bool {
        self.from == self.to || (self.from.is_geographic() && self.to.is_geographic())
    }

    /// Transform a single point.
    pub fn transform(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        if self.is_identity() {
            return Ok((x, y));
        }

        let (lon, lat) = match &self.source {
            Some(proj) => proj.unproject(x, y)?,
            None => (x, y),
        };

        if !(-90.0..=90.0).contains(&lat) {
            return Err(ProjectionError::OutOfDomain {
                x,
                y,
                crs: self.from.to_string(),
            });
        }

        let (tx, ty) = match &self.target {
            Some(proj) => proj.project(lon, lat),
            None => (lon, lat),
        };

        if !tx.is_finite() || !ty.is_finite() {
            return Err(ProjectionError::NonFinite {
                x,
                y,
                crs: self.to.to_string(),
            });
        }
        Ok((tx, ty))
    }
}
