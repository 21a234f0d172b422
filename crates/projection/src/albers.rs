//! Albers Equal-Area Conic projection (ellipsoidal form).
//!
//! Used by national equal-area grids such as GDA94 Australian Albers
//! (EPSG:3577) and NAD83 CONUS Albers (EPSG:5070).
//!
//! The projection parameters include:
//! - Latitude of origin (lat0) and central meridian (lon0)
//! - Two standard parallels (lat1, lat2)
//! - False easting / northing
//!
//! Formulas follow Snyder, "Map Projections: A Working Manual", pp. 101-102.

use std::f64::consts::PI;

use crate::ellipsoid::Ellipsoid;
use crate::error::{ProjectionError, ProjectionResult};

const MAX_ITERATIONS: usize = 25;
const CONVERGENCE: f64 = 1e-12;

/// Albers Equal-Area Conic projection parameters.
#[derive(Debug, Clone)]
pub struct AlbersEqualArea {
    /// Central meridian in radians
    pub lon0: f64,
    /// Latitude of origin in radians
    pub lat0: f64,
    /// First standard parallel in radians
    pub lat1: f64,
    /// Second standard parallel in radians
    pub lat2: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    pub ellipsoid: Ellipsoid,
    /// Cone constant
    n: f64,
    /// C constant
    c: f64,
    /// Rho at the latitude of origin
    rho0: f64,
}

impl AlbersEqualArea {
    /// Create a projection from parameters in degrees.
    pub fn new(
        lat0_deg: f64,
        lon0_deg: f64,
        lat1_deg: f64,
        lat2_deg: f64,
        false_easting: f64,
        false_northing: f64,
        ellipsoid: Ellipsoid,
    ) -> Self {
        let to_rad = PI / 180.0;
        let lat0 = lat0_deg * to_rad;
        let lon0 = lon0_deg * to_rad;
        let lat1 = lat1_deg * to_rad;
        let lat2 = lat2_deg * to_rad;

        let e = ellipsoid.e();
        let m1 = m(lat1, e);
        let m2 = m(lat2, e);
        let q0 = q(lat0, e);
        let q1 = q(lat1, e);
        let q2 = q(lat2, e);

        let n = if (lat1 - lat2).abs() < 1e-10 {
            // Tangent cone
            lat1.sin()
        } else {
            (m1 * m1 - m2 * m2) / (q2 - q1)
        };
        let c = m1 * m1 + n * q1;
        let rho0 = ellipsoid.a * (c - n * q0).sqrt() / n;

        Self {
            lon0,
            lat0,
            lat1,
            lat2,
            false_easting,
            false_northing,
            ellipsoid,
            n,
            c,
            rho0,
        }
    }

    /// GDA94 / Australian Albers (EPSG:3577).
    pub fn australian() -> Self {
        Self::new(0.0, 132.0, -18.0, -36.0, 0.0, 0.0, Ellipsoid::GRS80)
    }

    /// NAD83 / Conus Albers (EPSG:5070).
    pub fn conus() -> Self {
        Self::new(23.0, -96.0, 29.5, 45.5, 0.0, 0.0, Ellipsoid::GRS80)
    }

    /// Project geographic degrees to (x, y) meters.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let to_rad = PI / 180.0;
        let lat = lat_deg * to_rad;
        let dlon = normalize_angle(lon_deg * to_rad - self.lon0);

        let rho = self.ellipsoid.a * (self.c - self.n * q(lat, self.ellipsoid.e())).sqrt() / self.n;
        let theta = self.n * dlon;

        (
            rho * theta.sin() + self.false_easting,
            self.rho0 - rho * theta.cos() + self.false_northing,
        )
    }

    /// Unproject (x, y) meters to geographic degrees (lon, lat).
    pub fn inverse(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        let to_deg = 180.0 / PI;
        let a = self.ellipsoid.a;
        let e = self.ellipsoid.e();
        let e2 = self.ellipsoid.e2();

        let x0 = x - self.false_easting;
        let dy = self.rho0 - (y - self.false_northing);

        let (rho, theta) = if self.n >= 0.0 {
            ((x0 * x0 + dy * dy).sqrt(), x0.atan2(dy))
        } else {
            (-(x0 * x0 + dy * dy).sqrt(), (-x0).atan2(-dy))
        };

        let qv = (self.c - (rho * rho * self.n * self.n) / (a * a)) / self.n;
        let lon = self.lon0 + theta / self.n;

        // Poles: q reaches its limit and the series degenerates.
        let q_pole = 1.0 - (1.0 - e2) / (2.0 * e) * ((1.0 - e) / (1.0 + e)).ln();
        if (qv.abs() - q_pole).abs() < 1e-10 {
            return Ok((normalize_angle(lon) * to_deg, qv.signum() * 90.0));
        }
        if qv.abs() > q_pole {
            return Err(ProjectionError::OutOfDomain {
                x,
                y,
                crs: "Albers Equal Area".to_string(),
            });
        }

        let mut lat = (qv / 2.0).asin();
        for _ in 0..MAX_ITERATIONS {
            let sin = lat.sin();
            let cos = lat.cos();
            let con = 1.0 - e2 * sin * sin;
            let delta = con * con / (2.0 * cos)
                * (qv / (1.0 - e2) - sin / con + 1.0 / (2.0 * e) * ((1.0 - e * sin) / (1.0 + e * sin)).ln());
            lat += delta;
            if delta.abs() < CONVERGENCE {
                return Ok((normalize_angle(lon) * to_deg, lat * to_deg));
            }
        }

        Err(ProjectionError::NoConvergence { x, y })
    }
}

fn m(lat: f64, e: f64) -> f64 {
    let sin = lat.sin();
    lat.cos() / (1.0 - e * e * sin * sin).sqrt()
}

fn q(lat: f64, e: f64) -> f64 {
    let sin = lat.sin();
    let e2 = e * e;
    (1.0 - e2)
        * (sin / (1.0 - e2 * sin * sin)
            - 1.0 / (2.0 * e) * ((1.0 - e * sin) / (1.0 + e * sin)).ln())
}

/// Wrap an angle in radians to [-π, π].
fn normalize_angle(mut angle: f64) -> f64 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}
