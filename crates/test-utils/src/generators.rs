//! Synthetic reanalysis-like data.
//!
//! Fields carry the same dimension names, attributes and ordering as the
//! 2 m air temperature reanalysis files, with values chosen so tests can
//! verify every cell.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use geo::{polygon, MultiPolygon, Polygon};
use grid_common::CrsCode;
use grid_processor::{AttrValue, Coordinate, GriddedField};
use ndarray::{Array, Array2, IxDyn};

use crate::fixtures::grid::GridSpec;

/// Daily time labels at 00:00 starting at `start` (`YYYY-MM-DD`).
pub fn daily_times(start: &str, days: usize) -> Vec<NaiveDateTime> {
    let first = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .expect("valid start date")
        .and_hms_opt(0, 0, 0)
        .expect("valid midnight");
    (0..days).map(|d| first + Duration::days(d as i64)).collect()
}

/// Temperature-like value in Kelvin for a cell.
///
/// Warmer towards the equator, with a small day-to-day drift:
/// `300 - |lat| * 0.5 + day`.
pub fn temperature_at(day: usize, lat: f64, _lon: f64) -> f32 {
    (300.0 - lat.abs() * 0.5 + day as f64) as f32
}

/// A (time, lat, lon) field in Kelvin on `spec`, one step per day.
pub fn reanalysis_field(spec: GridSpec, start: &str, days: usize) -> GriddedField {
    let times = daily_times(start, days);
    let lats = spec.lats();
    let lons = spec.lons();
    let data = Array::from_shape_fn(IxDyn(&[days, lats.len(), lons.len()]), |ix| {
        temperature_at(ix[0], lats[ix[1]], lons[ix[2]])
    });

    GriddedField::new(
        "air",
        vec![
            Coordinate::time("time", times),
            Coordinate::numeric("lat", lats),
            Coordinate::numeric("lon", lons),
        ],
        data,
    )
    .expect("generated field is well formed")
    .with_attr("units", AttrValue::Text("degK".to_string()))
    .with_attr("long_name", AttrValue::Text("mean Daily Air temperature at 2 m".to_string()))
    .with_crs(CrsCode::Epsg4326)
}

/// A 2-D (lat, lon) field filled with `value`, without units or CRS.
pub fn constant_field(spec: GridSpec, value: f32) -> GriddedField {
    let lats = spec.lats();
    let lons = spec.lons();
    let data = Array::from_elem(IxDyn(&[lats.len(), lons.len()]), value);
    GriddedField::new(
        "data",
        vec![Coordinate::numeric("lat", lats), Coordinate::numeric("lon", lons)],
        data,
    )
    .expect("generated field is well formed")
}

/// Axis-aligned rectangle polygon.
pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
    polygon![
        (x: min_x, y: min_y),
        (x: max_x, y: min_y),
        (x: max_x, y: max_y),
        (x: min_x, y: max_y),
        (x: min_x, y: min_y),
    ]
}

/// Right triangle with the right angle at (x0, y0).
pub fn triangle(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
    polygon![
        (x: x0, y: y0),
        (x: x0 + size, y: y0),
        (x: x0, y: y0 + size),
        (x: x0, y: y0),
    ]
}

/// Wrap a polygon into a multipolygon.
pub fn multi(polygon: Polygon<f64>) -> MultiPolygon<f64> {
    MultiPolygon(vec![polygon])
}

/// Reference presence grid: cell centres of a north-up grid that fall
/// inside an axis-aligned rectangle (boundary inclusive).
pub fn expected_rectangle_mask(
    lats: &[f64],
    lons: &[f64],
    (min_x, min_y, max_x, max_y): (f64, f64, f64, f64),
) -> Array2<bool> {
    Array2::from_shape_fn((lats.len(), lons.len()), |(r, c)| {
        (min_x..=max_x).contains(&lons[c]) && (min_y..=max_y).contains(&lats[r])
    })
}
