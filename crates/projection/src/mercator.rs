//! Spherical Web Mercator (EPSG:3857).

use std::f64::consts::PI;

use crate::error::{ProjectionError, ProjectionResult};

/// Sphere radius used by Web Mercator (the WGS84 semi-major axis).
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude limit that makes the projected world square.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Half the projected world width in meters.
pub const MAX_EXTENT: f64 = 20037508.342789244;

#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    /// Project geographic degrees to (x, y) meters.
    ///
    /// Latitudes beyond ±85.0511° are clamped.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = EARTH_RADIUS * lon_deg.to_radians();
        let y = EARTH_RADIUS * (PI / 4.0 + lat / 2.0).tan().ln();
        (x, y)
    }

    /// Unproject (x, y) meters to geographic degrees (lon, lat).
    pub fn inverse(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        if x.abs() > MAX_EXTENT * 1.000001 {
            return Err(ProjectionError::OutOfDomain {
                x,
                y,
                crs: "EPSG:3857".to_string(),
            });
        }
        let lon = (x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        Ok((lon, lat))
    }
}
