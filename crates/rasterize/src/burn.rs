//! Cell membership and burning.

use geo::{BoundingRect, Coord, Intersects, LineString, MultiPolygon, Point, Polygon};
use grid_common::GeoTransform;
use ndarray::Array2;

use crate::options::MergeAlg;

/// Target raster for burning: shape plus the affine that places it.
pub(crate) struct BurnGrid {
    pub rows: usize,
    pub cols: usize,
    pub transform: GeoTransform,
    /// Maps (x, y) back to fractional (col, row)
    pub inverse: GeoTransform,
    pub all_touched: bool,
}

impl BurnGrid {
    /// Cells selected by `geometry`, in row-major order.
    pub fn cells(&self, geometry: &MultiPolygon<f64>) -> Vec<(usize, usize)> {
        let Some((row_range, col_range)) = self.candidate_window(geometry) else {
            return Vec::new();
        };

        let mut cells = Vec::new();
        for row in row_range {
            for col in col_range.clone() {
                if self.selects(geometry, row, col) {
                    cells.push((row, col));
                }
            }
        }
        cells
    }

    fn selects(&self, geometry: &MultiPolygon<f64>, row: usize, col: usize) -> bool {
        if self.all_touched {
            geometry.intersects(&self.cell_polygon(row, col))
        } else {
            let (x, y) = self.transform.cell_center(col, row);
            geometry.intersects(&Point::new(x, y))
        }
    }

    fn cell_polygon(&self, row: usize, col: usize) -> Polygon<f64> {
        let (c, r) = (col as f64, row as f64);
        let corners = [(c, r), (c + 1.0, r), (c + 1.0, r + 1.0), (c, r + 1.0), (c, r)];
        let ring = corners
            .iter()
            .map(|&(cc, rr)| {
                let (x, y) = self.transform.apply(cc, rr);
                Coord { x, y }
            })
            .collect::<Vec<_>>();
        Polygon::new(LineString(ring), Vec::new())
    }

    /// Row and column ranges covering the geometry's bounding box, padded by
    /// one cell so edge-touching cells are still tested.
    fn candidate_window(
        &self,
        geometry: &MultiPolygon<f64>,
    ) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
        let rect = geometry.bounding_rect()?;
        let (min, max) = (rect.min(), rect.max());

        let mut col_lo = f64::INFINITY;
        let mut col_hi = f64::NEG_INFINITY;
        let mut row_lo = f64::INFINITY;
        let mut row_hi = f64::NEG_INFINITY;
        for (x, y) in [(min.x, min.y), (max.x, min.y), (min.x, max.y), (max.x, max.y)] {
            let (col, row) = self.inverse.apply(x, y);
            col_lo = col_lo.min(col);
            col_hi = col_hi.max(col);
            row_lo = row_lo.min(row);
            row_hi = row_hi.max(row);
        }
        if !(col_lo.is_finite() && col_hi.is_finite() && row_lo.is_finite() && row_hi.is_finite()) {
            return None;
        }

        let clamp = |v: f64, n: usize| v.max(0.0).min(n as f64) as usize;
        let cols = clamp(col_lo.floor() - 1.0, self.cols)..clamp(col_hi.ceil() + 1.0, self.cols);
        let rows = clamp(row_lo.floor() - 1.0, self.rows)..clamp(row_hi.ceil() + 1.0, self.rows);
        if cols.is_empty() || rows.is_empty() {
            return None;
        }
        Some((rows, cols))
    }
}

/// Mark every cell any geometry selects.
pub(crate) fn burn_presence<'a>(
    grid: &BurnGrid,
    geometries: impl Iterator<Item = &'a MultiPolygon<f64>>,
) -> Array2<bool> {
    let mut out = Array2::from_elem((grid.rows, grid.cols), false);
    for geometry in geometries {
        for (row, col) in grid.cells(geometry) {
            out[[row, col]] = true;
        }
    }
    out
}

/// Burn `(geometry, value)` pairs in order onto a `fill` background.
pub(crate) fn burn_values<'a>(
    grid: &BurnGrid,
    shapes: impl Iterator<Item = (&'a MultiPolygon<f64>, f64)>,
    fill: f64,
    merge: MergeAlg,
) -> Array2<f64> {
    let mut out = Array2::from_elem((grid.rows, grid.cols), fill);
    for (geometry, value) in shapes {
        for (row, col) in grid.cells(geometry) {
            let cell = &mut out[[row, col]];
            *cell = match merge {
                MergeAlg::Replace => value,
                MergeAlg::Add => *cell + value,
            };
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    /// 10 × 10 unit cells, north-up, top-left at (0, 10).
    fn grid(all_touched: bool) -> BurnGrid {
        let transform = GeoTransform::from_origin(0.0, 10.0, 1.0, 1.0);
        BurnGrid {
            rows: 10,
            cols: 10,
            transform,
            inverse: transform.inverse().unwrap(),
            all_touched,
        }
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
            (x: x0, y: y0),
        ]])
    }

    #[test]
    fn test_centre_rule() {
        // Covers centres x in {2.5, 3.5}, y in {6.5, 7.5}
        let cells = grid(false).cells(&square(2.2, 6.2, 3.8, 7.8));
        assert_eq!(cells, vec![(2, 2), (2, 3), (3, 2), (3, 3)]);
    }

    #[test]
    fn test_small_polygon_misses_centres() {
        let shape = square(2.1, 6.1, 2.4, 6.4);
        assert!(grid(false).cells(&shape).is_empty());
        assert_eq!(grid(true).cells(&shape), vec![(3, 2)]);
    }

    #[test]
    fn test_centre_on_boundary_counts() {
        let cells = grid(false).cells(&square(2.5, 6.5, 3.0, 7.0));
        assert_eq!(cells, vec![(3, 2)]);
    }

    #[test]
    fn test_outside_grid() {
        assert!(grid(true).cells(&square(20.0, 20.0, 25.0, 25.0)).is_empty());
        // Partly outside is clipped
        let cells = grid(false).cells(&square(-5.0, 9.2, 0.8, 12.0));
        assert_eq!(cells, vec![(0, 0)]);
    }

    #[test]
    fn test_merge_algorithms() {
        let g = grid(false);
        let a = square(0.0, 8.0, 2.0, 10.0);
        let b = square(1.0, 8.0, 3.0, 10.0);

        let replaced = burn_values(&g, vec![(&a, 1.0), (&b, 5.0)].into_iter(), 0.0, MergeAlg::Replace);
        assert_eq!(replaced[[0, 0]], 1.0);
        assert_eq!(replaced[[0, 1]], 5.0);
        assert_eq!(replaced[[0, 2]], 5.0);
        assert_eq!(replaced[[5, 5]], 0.0);

        let added = burn_values(&g, vec![(&a, 1.0), (&b, 5.0)].into_iter(), -1.0, MergeAlg::Add);
        assert_eq!(added[[0, 0]], 0.0);
        assert_eq!(added[[0, 1]], 5.0);
        assert_eq!(added[[5, 5]], -1.0);
    }
}
