//! Colour-mapped raster of a 2-D field.

use grid_common::ColorScale;
use image::{Rgba, RgbaImage};
use ndarray::Array2;

/// Colour every cell of `grid` and draw it as a `cell_size` square block.
///
/// `grid` must already be north-up (row 0 is the northernmost row). NaN
/// cells get the scale's no-data colour, transparent by default.
pub fn render_cells(grid: &Array2<f32>, scale: &ColorScale, cell_size: u32) -> RgbaImage {
    let (rows, cols) = grid.dim();
    let cell = cell_size.max(1);
    let mut img = RgbaImage::new(cols as u32 * cell, rows as u32 * cell);

    for ((row, col), &value) in grid.indexed_iter() {
        let (r, g, b, a) = scale.color_for(value as f64);
        let px = Rgba([r, g, b, a]);
        let x0 = col as u32 * cell;
        let y0 = row as u32 * cell;
        for y in y0..y0 + cell {
            for x in x0..x0 + cell {
                img.put_pixel(x, y, px);
            }
        }
    }
    img
}

/// One swatch per colour bin, left to right from `vmin` to `vmax`.
pub fn render_legend(scale: &ColorScale, width: u32, height: u32) -> RgbaImage {
    let edges = scale.boundaries();
    let mut img = RgbaImage::new(width, height);
    if width == 0 || height == 0 {
        return img;
    }

    let span = scale.vmax - scale.vmin;
    for x in 0..width {
        let value = scale.vmin + span * (x as f64 + 0.5) / width as f64;
        // Continuous scales sample the gradient directly; binned ones take the
        // bin's colour through `color_for`.
        let (r, g, b, a) = if edges.len() < 2 {
            scale.sample((value - scale.vmin) / span).to_rgba()
        } else {
            scale.color_for(value)
        };
        for y in 0..height {
            img.put_pixel(x, y, Rgba([r, g, b, a]));
        }
    }
    img
}

/// Flip rows and columns so that north is up and east is right.
pub fn orient_north_up(grid: Array2<f32>, lat_descending: bool, lon_descending: bool) -> Array2<f32> {
    let mut grid = grid;
    if !lat_descending {
        grid.invert_axis(ndarray::Axis(0));
    }
    if lon_descending {
        grid.invert_axis(ndarray::Axis(1));
    }
    grid
}
