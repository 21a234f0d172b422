//! Affine grid geometry: cell indices to map coordinates.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Relative tolerance used when deciding whether coordinate labels are
/// regularly spaced.
pub const REGULAR_SPACING_TOLERANCE: f64 = 1e-3;

/// Six-parameter affine transform from (col, row) to (x, y).
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
///
/// Parameter order matches the Python `affine.Affine` type, which is what most
/// users will copy transforms from. GDAL orders the same six numbers as
/// `[c, a, b, f, d, e]`; see [`GeoTransform::from_gdal`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl GeoTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up transform from the top-left corner and cell sizes.
    pub fn from_origin(west: f64, north: f64, x_size: f64, y_size: f64) -> Self {
        Self::new(x_size, 0.0, west, 0.0, -y_size, north)
    }

    /// Build from GDAL ordering `[c, a, b, f, d, e]`.
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self::new(gt[1], gt[2], gt[0], gt[4], gt[5], gt[3])
    }

    /// GDAL ordering `[c, a, b, f, d, e]`.
    pub fn to_gdal(&self) -> [f64; 6] {
        [self.c, self.a, self.b, self.f, self.d, self.e]
    }

    /// Parse a GDAL `GeoTransform` attribute ("x0 dx rx y0 ry dy").
    pub fn from_gdal_str(s: &str) -> Option<Self> {
        let values: Vec<f64> = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .map(|p| p.parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        let gt: [f64; 6] = values.try_into().ok()?;
        Some(Self::from_gdal(gt))
    }

    /// Map a fractional (col, row) position to (x, y).
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// Coordinates of the centre of cell (col, row).
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// Whether the grid axes are aligned with the map axes.
    pub fn is_rectilinear(&self) -> bool {
        self.b == 0.0 && self.d == 0.0
    }

    /// Inverse transform mapping (x, y) back to fractional (col, row).
    pub fn inverse(&self) -> Option<GeoTransform> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let ia = self.e / det;
        let ib = -self.b / det;
        let id = -self.d / det;
        let ie = self.a / det;
        Some(GeoTransform {
            a: ia,
            b: ib,
            c: -(ia * self.c + ib * self.f),
            d: id,
            e: ie,
            f: -(id * self.c + ie * self.f),
        })
    }
}

/// The footprint of a 2-D grid: its shape plus the transform that places it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBox {
    /// Number of columns (x)
    pub width: usize,
    /// Number of rows (y)
    pub height: usize,
    pub transform: GeoTransform,
}

impl GeoBox {
    pub fn new(width: usize, height: usize, transform: GeoTransform) -> Self {
        Self {
            width,
            height,
            transform,
        }
    }

    /// Derive a geobox from cell-centre coordinate labels.
    ///
    /// Both axes need at least two labels and regular spacing (within
    /// `rel_tol` of the mean step). Descending axes give a negative scale.
    pub fn from_coords(x: &[f64], y: &[f64], rel_tol: f64) -> Option<GeoBox> {
        let dx = regular_step(x, rel_tol)?;
        let dy = regular_step(y, rel_tol)?;

        let transform = GeoTransform::new(
            dx,
            0.0,
            x[0] - dx / 2.0,
            0.0,
            dy,
            y[0] - dy / 2.0,
        );
        Some(GeoBox::new(x.len(), y.len(), transform))
    }

    /// Map-space bounds of the whole grid.
    pub fn bounds(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for (col, row) in [
            (0.0, 0.0),
            (self.width as f64, 0.0),
            (0.0, self.height as f64),
            (self.width as f64, self.height as f64),
        ] {
            let (x, y) = self.transform.apply(col, row);
            bbox.expand(x, y);
        }
        bbox
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Mean step of a regularly spaced axis, if it is one.
fn regular_step(values: &[f64], rel_tol: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let step = (values[values.len() - 1] - values[0]) / (values.len() - 1) as f64;
    if step == 0.0 || !step.is_finite() {
        return None;
    }
    let regular = values
        .windows(2)
        .all(|w| ((w[1] - w[0]) - step).abs() <= rel_tol * step.abs());
    regular.then_some(step)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_apply_and_inverse() {
        let t = GeoTransform::new(30.0, 0.0, 548040.0, 0.0, -30.0, 6886890.0);
        let (x, y) = t.apply(10.0, 20.0);
        assert!(approx(x, 548340.0));
        assert!(approx(y, 6886290.0));

        let inv = t.inverse().unwrap();
        let (col, row) = inv.apply(x, y);
        assert!(approx(col, 10.0));
        assert!(approx(row, 20.0));
    }

    #[test]
    fn test_gdal_roundtrip_order() {
        let t = GeoTransform::from_gdal_str("67.0 1.875 0 39.0 0 -1.9").unwrap();
        assert_eq!(t.a, 1.875);
        assert_eq!(t.c, 67.0);
        assert_eq!(t.e, -1.9);
        assert_eq!(t.f, 39.0);
        assert_eq!(t.to_gdal(), [67.0, 1.875, 0.0, 39.0, 0.0, -1.9]);
        assert!(GeoTransform::from_gdal_str("1 2 3").is_none());
    }

    #[test]
    fn test_geobox_from_descending_latitudes() {
        let lon = [0.0, 1.0, 2.0, 3.0];
        let lat = [10.0, 9.0, 8.0];
        let geobox = GeoBox::from_coords(&lon, &lat, REGULAR_SPACING_TOLERANCE).unwrap();

        assert_eq!(geobox.width, 4);
        assert_eq!(geobox.height, 3);
        let (x, y) = geobox.transform.cell_center(0, 0);
        assert!(approx(x, 0.0));
        assert!(approx(y, 10.0));
        let (x, y) = geobox.transform.cell_center(3, 2);
        assert!(approx(x, 3.0));
        assert!(approx(y, 8.0));

        let bounds = geobox.bounds();
        assert!(approx(bounds.min_x, -0.5) && approx(bounds.max_x, 3.5));
        assert!(approx(bounds.min_y, 7.5) && approx(bounds.max_y, 10.5));
    }

    #[test]
    fn test_geobox_rejects_irregular_axis() {
        let lon = [0.0, 1.0, 2.0];
        let lat = [0.0, 1.0, 3.0];
        assert!(GeoBox::from_coords(&lon, &lat, REGULAR_SPACING_TOLERANCE).is_none());
        assert!(GeoBox::from_coords(&[1.0], &lat, REGULAR_SPACING_TOLERANCE).is_none());
    }

    #[test]
    fn test_cell_center_from_origin() {
        let t = GeoTransform::from_origin(0.0, 10.0, 2.0, 2.0);
        assert_eq!(t.cell_center(1, 1), (3.0, 7.0));
        assert!(t.is_rectilinear());
    }
}
